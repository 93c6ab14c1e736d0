// src/common/saga.rs
//
// Registro passo-a-passo de escritas em várias etapas sem transação.
// Cada passo fica marcado como concluído, falho ou pulado, para que a
// resposta diga exatamente o que ficou gravado e o que pode ser refeito.

use serde::Serialize;
use utoipa::ToSchema;

use crate::common::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum StepState {
    Succeeded,
    Failed,
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StepReport {
    #[schema(example = "insert_stage:Concept")]
    pub step: String,
    pub state: StepState,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SagaReport {
    pub steps: Vec<StepReport>,
}

impl SagaReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registra o resultado de um passo. Falhas são logadas aqui, uma vez.
    pub fn record(&mut self, step: impl Into<String>, result: Result<(), AppError>) -> bool {
        let step = step.into();
        match result {
            Ok(()) => {
                self.steps.push(StepReport { step, state: StepState::Succeeded, error: None });
                true
            }
            Err(e) => {
                tracing::error!(step = %step, error = %e, "Passo da saga falhou");
                self.steps.push(StepReport {
                    step,
                    state: StepState::Failed,
                    error: Some(e.to_string()),
                });
                false
            }
        }
    }

    pub fn skip(&mut self, step: impl Into<String>, reason: &str) {
        self.steps.push(StepReport {
            step: step.into(),
            state: StepState::Skipped,
            error: Some(reason.to_string()),
        });
    }

    pub fn is_success(&self) -> bool {
        self.steps.iter().all(|s| s.state == StepState::Succeeded)
    }

    /// Passos que falharam ou foram pulados (candidatos a nova tentativa).
    pub fn pending_steps(&self) -> Vec<String> {
        self.steps
            .iter()
            .filter(|s| s.state != StepState::Succeeded)
            .map(|s| s.step.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracks_each_step_outcome() {
        let mut report = SagaReport::new();
        assert!(report.record("a", Ok(())));
        assert!(!report.record("b", Err(AppError::ResourceNotFound("stage".into()))));
        report.skip("c", "depends on b");

        assert!(!report.is_success());
        assert_eq!(report.pending_steps(), vec!["b".to_string(), "c".to_string()]);
        assert_eq!(report.steps[1].state, StepState::Failed);
        assert!(report.steps[1].error.as_deref().unwrap_or_default().contains("stage"));
    }

    #[test]
    fn empty_report_is_success() {
        assert!(SagaReport::new().is_success());
    }
}
