// src/services/stage_reconciliation.rs
//
// Mantém as linhas de project_stages (e project_fees) coerentes com a lista
// de nomes `projects.stages`. A chave é o nome da etapa, não o id.

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

use crate::{
    common::{error::AppError, saga::SagaReport},
    models::project::{InvoiceStatus, ProjectStage, StageInput},
};

/// Valores finais de uma etapa a gravar (entrada já mesclada com o existente).
#[derive(Debug, Clone, PartialEq)]
pub struct StageWrite {
    pub stage_name: String,
    pub fee: Decimal,
    pub is_applicable: bool,
    pub billing_month: Option<String>,
    pub invoice_date: Option<NaiveDate>,
    pub invoice_status: InvoiceStatus,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StagePlan {
    pub to_delete: Vec<String>,
    pub to_update: Vec<StageWrite>,
    pub to_insert: Vec<StageWrite>,
}

impl StagePlan {
    /// Todas as etapas que continuam selecionadas, na ordem do plano.
    pub fn kept_and_new(&self) -> impl Iterator<Item = &StageWrite> {
        self.to_update.iter().chain(self.to_insert.iter())
    }
}

/// Nomes selecionados sem repetição (a primeira ocorrência vence).
pub fn normalize_stage_inputs(selected: &[StageInput]) -> Vec<StageInput> {
    let mut seen = HashSet::new();
    selected
        .iter()
        .filter_map(|s| {
            let name = s.stage_name.trim();
            if name.is_empty() || !seen.insert(name.to_string()) {
                return None;
            }
            let mut stage = s.clone();
            stage.stage_name = name.to_string();
            Some(stage)
        })
        .collect()
}

/// Diferença entre as etapas gravadas e as selecionadas:
/// removidas são apagadas, mantidas são atualizadas (preservando a fee quando
/// não informada) e novas são inseridas.
pub fn plan_stage_reconciliation(existing: &[ProjectStage], selected: &[StageInput]) -> StagePlan {
    let selected = normalize_stage_inputs(selected);
    let existing_by_name: HashMap<&str, &ProjectStage> =
        existing.iter().map(|s| (s.stage_name.as_str(), s)).collect();
    let selected_names: HashSet<&str> = selected.iter().map(|s| s.stage_name.as_str()).collect();

    let to_delete = existing
        .iter()
        .filter(|s| !selected_names.contains(s.stage_name.as_str()))
        .map(|s| s.stage_name.clone())
        .collect();

    let mut plan = StagePlan { to_delete, ..Default::default() };

    for input in &selected {
        match existing_by_name.get(input.stage_name.as_str()) {
            Some(current) => plan.to_update.push(StageWrite {
                stage_name: input.stage_name.clone(),
                fee: input.fee.unwrap_or(current.fee),
                is_applicable: input.is_applicable,
                billing_month: input.billing_month.clone().or_else(|| current.billing_month.clone()),
                invoice_date: input.invoice_date.or(current.invoice_date),
                invoice_status: input.invoice_status.unwrap_or(current.invoice_status),
            }),
            None => plan.to_insert.push(StageWrite {
                stage_name: input.stage_name.clone(),
                fee: input.fee.unwrap_or(Decimal::ZERO),
                is_applicable: input.is_applicable,
                billing_month: input.billing_month.clone(),
                invoice_date: input.invoice_date,
                invoice_status: input.invoice_status.unwrap_or_default(),
            }),
        }
    }

    plan
}

/// Entradas para uma nova tentativa: as últimas submetidas, quando uma gravação
/// incompleta as deixou guardadas; senão a lista `projects.stages`, com fees e
/// dados de faturamento vindos das linhas já gravadas.
pub fn retry_stage_inputs(
    stage_names: &[String],
    existing: &[ProjectStage],
    pending: Option<Vec<StageInput>>,
) -> Vec<StageInput> {
    if let Some(pending) = pending {
        return normalize_stage_inputs(&pending);
    }

    stage_names
        .iter()
        .map(|name| StageInput {
            stage_name: name.clone(),
            fee: None,
            is_applicable: existing
                .iter()
                .find(|s| &s.stage_name == name)
                .is_none_or(|s| s.is_applicable),
            billing_month: None,
            invoice_date: None,
            invoice_status: None,
        })
        .collect()
}

/// Operações remotas usadas pela reconciliação.
#[async_trait]
pub trait StageStore: Send {
    async fn delete_stage(&mut self, project_id: Uuid, stage_name: &str) -> Result<(), AppError>;
    async fn upsert_stage(&mut self, project_id: Uuid, stage: &StageWrite) -> Result<(), AppError>;
    async fn upsert_fee(&mut self, project_id: Uuid, stage: &StageWrite, currency: &str) -> Result<(), AppError>;
}

pub fn delete_step(name: &str) -> String {
    format!("delete_stage:{}", name)
}

pub fn update_step(name: &str) -> String {
    format!("update_stage:{}", name)
}

pub fn insert_step(name: &str) -> String {
    format!("insert_stage:{}", name)
}

pub fn fee_step(name: &str) -> String {
    format!("upsert_fee:{}", name)
}

/// Executa o plano em ordem: apagar, atualizar, inserir e, por fim, a fee de
/// cada etapa. Falhas não interrompem os passos seguintes nem desfazem os
/// anteriores; a fee de uma etapa cuja gravação falhou é pulada.
/// `only` restringe a execução a um subconjunto de passos (nova tentativa).
pub async fn run_stage_saga<S: StageStore + ?Sized>(
    store: &mut S,
    project_id: Uuid,
    plan: &StagePlan,
    currency: &str,
    only: Option<&HashSet<String>>,
) -> SagaReport {
    let selected = |step: &str| only.is_none_or(|steps| steps.contains(step));
    let mut report = SagaReport::new();
    let mut failed_stages: HashSet<&str> = HashSet::new();

    for name in &plan.to_delete {
        let step = delete_step(name);
        if selected(&step) {
            let result = store.delete_stage(project_id, name).await;
            report.record(step, result);
        }
    }

    for (stage, step) in plan
        .to_update
        .iter()
        .map(|s| (s, update_step(&s.stage_name)))
        .chain(plan.to_insert.iter().map(|s| (s, insert_step(&s.stage_name))))
    {
        if selected(&step) {
            let result = store.upsert_stage(project_id, stage).await;
            if !report.record(step, result) {
                failed_stages.insert(stage.stage_name.as_str());
            }
        }
    }

    for stage in plan.kept_and_new() {
        let step = fee_step(&stage.stage_name);
        if !selected(&step) {
            continue;
        }
        if failed_stages.contains(stage.stage_name.as_str()) {
            report.skip(step, "stage write failed");
            continue;
        }
        let result = store.upsert_fee(project_id, stage, currency).await;
        report.record(step, result);
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::saga::StepState;
    use std::collections::BTreeMap;

    // Store em memória: project_stages e project_fees indexados por nome
    #[derive(Default)]
    struct MemoryStageStore {
        stages: BTreeMap<String, StageWrite>,
        fees: BTreeMap<String, Decimal>,
        fail_on: HashSet<String>,
        calls: Vec<String>,
    }

    impl MemoryStageStore {
        fn check(&mut self, step: String) -> Result<(), AppError> {
            self.calls.push(step.clone());
            if self.fail_on.contains(&step) {
                return Err(AppError::InternalServerError(anyhow::anyhow!("falha simulada em {}", step)));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl StageStore for MemoryStageStore {
        async fn delete_stage(&mut self, _project_id: Uuid, stage_name: &str) -> Result<(), AppError> {
            self.check(delete_step(stage_name))?;
            self.stages.remove(stage_name);
            Ok(())
        }

        async fn upsert_stage(&mut self, _project_id: Uuid, stage: &StageWrite) -> Result<(), AppError> {
            let step = if self.stages.contains_key(&stage.stage_name) {
                update_step(&stage.stage_name)
            } else {
                insert_step(&stage.stage_name)
            };
            self.check(step)?;
            self.stages.insert(stage.stage_name.clone(), stage.clone());
            Ok(())
        }

        async fn upsert_fee(&mut self, _project_id: Uuid, stage: &StageWrite, _currency: &str) -> Result<(), AppError> {
            self.check(fee_step(&stage.stage_name))?;
            self.fees.insert(stage.stage_name.clone(), stage.fee);
            Ok(())
        }
    }

    fn dec(v: i64) -> Decimal {
        Decimal::new(v, 0)
    }

    fn input(name: &str, fee: Option<i64>) -> StageInput {
        StageInput {
            stage_name: name.to_string(),
            fee: fee.map(dec),
            is_applicable: true,
            billing_month: None,
            invoice_date: None,
            invoice_status: None,
        }
    }

    fn existing_rows(store: &MemoryStageStore, project_id: Uuid) -> Vec<ProjectStage> {
        store
            .stages
            .values()
            .map(|s| ProjectStage {
                id: Uuid::new_v4(),
                company_id: Uuid::nil(),
                project_id,
                stage_name: s.stage_name.clone(),
                fee: s.fee,
                is_applicable: s.is_applicable,
                billing_month: s.billing_month.clone(),
                invoice_date: s.invoice_date,
                invoice_status: s.invoice_status,
            })
            .collect()
    }

    #[test]
    fn plan_diffs_by_stage_name() {
        let project_id = Uuid::new_v4();
        let mut store = MemoryStageStore::default();
        for (name, fee) in [("A", 100), ("B", 200)] {
            store.stages.insert(name.into(), plan_stage_reconciliation(&[], &[input(name, Some(fee))]).to_insert[0].clone());
        }

        let plan = plan_stage_reconciliation(&existing_rows(&store, project_id), &[input("B", None), input("C", Some(50))]);
        assert_eq!(plan.to_delete, vec!["A".to_string()]);
        assert_eq!(plan.to_update.len(), 1);
        assert_eq!(plan.to_update[0].fee, dec(200));
        assert_eq!(plan.to_insert[0].stage_name, "C");
    }

    #[test]
    fn duplicate_and_blank_names_are_ignored() {
        let plan = plan_stage_reconciliation(&[], &[input(" A ", Some(1)), input("A", Some(2)), input("  ", None)]);
        assert_eq!(plan.to_insert.len(), 1);
        assert_eq!(plan.to_insert[0].stage_name, "A");
        assert_eq!(plan.to_insert[0].fee, dec(1));
    }

    #[tokio::test]
    async fn create_then_edit_deletes_retains_and_creates() {
        let project_id = Uuid::new_v4();
        let mut store = MemoryStageStore::default();

        let create = plan_stage_reconciliation(&[], &[input("A", Some(100)), input("B", Some(200))]);
        let report = run_stage_saga(&mut store, project_id, &create, "USD", None).await;
        assert!(report.is_success());

        let edit = plan_stage_reconciliation(&existing_rows(&store, project_id), &[input("B", None), input("C", Some(300))]);
        let report = run_stage_saga(&mut store, project_id, &edit, "USD", None).await;

        assert!(report.is_success());
        assert_eq!(store.stages.keys().cloned().collect::<Vec<_>>(), vec!["B", "C"]);
        assert_eq!(store.stages["B"].fee, dec(200));
        assert_eq!(store.stages["C"].fee, dec(300));
        assert_eq!(store.fees["B"], dec(200));
        assert_eq!(
            report.steps.iter().map(|s| s.step.as_str()).collect::<Vec<_>>(),
            vec!["delete_stage:A", "update_stage:B", "insert_stage:C", "upsert_fee:B", "upsert_fee:C"]
        );
    }

    #[tokio::test]
    async fn partial_failure_is_reported_per_step_and_can_be_retried() {
        let project_id = Uuid::new_v4();
        let mut store = MemoryStageStore::default();
        store.fail_on.insert(insert_step("B"));

        let plan = plan_stage_reconciliation(&[], &[input("A", Some(100)), input("B", Some(200))]);
        let report = run_stage_saga(&mut store, project_id, &plan, "USD", None).await;

        assert!(!report.is_success());
        let states: Vec<(&str, StepState)> = report.steps.iter().map(|s| (s.step.as_str(), s.state)).collect();
        assert_eq!(
            states,
            vec![
                ("insert_stage:A", StepState::Succeeded),
                ("insert_stage:B", StepState::Failed),
                ("upsert_fee:A", StepState::Succeeded),
                ("upsert_fee:B", StepState::Skipped),
            ]
        );
        // A continua gravada: nada é desfeito
        assert!(store.stages.contains_key("A"));

        store.fail_on.clear();
        store.calls.clear();
        let pending: HashSet<String> = report.pending_steps().into_iter().collect();
        let retry = run_stage_saga(&mut store, project_id, &plan, "USD", Some(&pending)).await;

        assert!(retry.is_success());
        assert_eq!(store.calls, vec!["insert_stage:B", "upsert_fee:B"]);
        assert_eq!(store.fees["B"], dec(200));
    }

    #[tokio::test]
    async fn retry_from_saved_inputs_keeps_submitted_fees() {
        let project_id = Uuid::new_v4();
        let mut store = MemoryStageStore::default();
        store.fail_on.insert(insert_step("B"));

        let submitted = vec![input("A", Some(100)), input("B", Some(200))];
        let plan = plan_stage_reconciliation(&[], &submitted);
        let report = run_stage_saga(&mut store, project_id, &plan, "USD", None).await;
        assert!(!report.is_success());
        store.fail_on.clear();

        // Novo plano montado só com o que está gravado + entradas guardadas
        let names = vec!["A".to_string(), "B".to_string()];
        let inputs = retry_stage_inputs(&names, &existing_rows(&store, project_id), Some(submitted));
        let plan = plan_stage_reconciliation(&existing_rows(&store, project_id), &inputs);
        let pending: HashSet<String> = report.pending_steps().into_iter().collect();
        let retry = run_stage_saga(&mut store, project_id, &plan, "USD", Some(&pending)).await;

        assert!(retry.is_success());
        assert_eq!(store.stages["B"].fee, dec(200));
        assert_eq!(store.fees["B"], dec(200));
        assert_eq!(store.stages["A"].fee, dec(100));
    }

    #[test]
    fn retry_without_saved_inputs_rebuilds_from_stage_names() {
        let project_id = Uuid::new_v4();
        let mut store = MemoryStageStore::default();
        let mut not_applicable = plan_stage_reconciliation(&[], &[input("A", Some(100))]).to_insert[0].clone();
        not_applicable.is_applicable = false;
        store.stages.insert("A".into(), not_applicable);

        let names = vec!["A".to_string(), "B".to_string()];
        let inputs = retry_stage_inputs(&names, &existing_rows(&store, project_id), None);

        assert_eq!(inputs.len(), 2);
        assert!(!inputs[0].is_applicable);
        assert!(inputs[1].is_applicable);
        assert!(inputs.iter().all(|i| i.fee.is_none()));

        let plan = plan_stage_reconciliation(&existing_rows(&store, project_id), &inputs);
        assert_eq!(plan.to_update[0].fee, dec(100));
    }
}
