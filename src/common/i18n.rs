// src/common/i18n.rs

use std::collections::HashMap;

pub const DEFAULT_LANG: &str = "en";

// Catálogo de mensagens por idioma. Chaves ausentes caem para o inglês
// e, por último, para a própria chave.
#[derive(Debug, Clone)]
pub struct I18nStore {
    messages: HashMap<&'static str, HashMap<&'static str, &'static str>>,
}

impl I18nStore {
    pub fn new() -> Self {
        let mut messages = HashMap::new();

        messages.insert(
            "en",
            HashMap::from([
                ("validation_failed", "One or more fields are invalid."),
                ("required", "This field is required."),
                ("invalid_range", "Value is out of range."),
                ("invalid_status", "Unknown project status."),
                ("invalid_email", "Invalid e-mail address."),
                ("password_too_short", "Password must have at least 6 characters."),
                ("duplicate_project_code", "Project code '{value}' is already in use."),
                ("empty_rejection_reason", "A reason is required to reject a leave request."),
                ("invalid_approver", "The selected approver cannot approve this request."),
                ("invalid_status_transition", "This request can no longer be changed ({value})."),
                ("not_found", "{value} not found."),
                ("permission_denied", "You need the '{value}' permission to perform this action."),
                ("missing_company_context", "Company context is missing."),
                ("email_already_exists", "This e-mail is already in use."),
                ("invalid_credentials", "Invalid e-mail or password."),
                ("invalid_token", "Authentication token is invalid or missing."),
                ("user_not_found", "User not found."),
                ("unexpected", "An unexpected error occurred."),
            ]),
        );

        messages.insert(
            "pt",
            HashMap::from([
                ("validation_failed", "Um ou mais campos são inválidos."),
                ("required", "Este campo é obrigatório."),
                ("invalid_range", "Valor fora do intervalo permitido."),
                ("invalid_status", "Status de projeto desconhecido."),
                ("invalid_email", "E-mail inválido."),
                ("password_too_short", "A senha deve ter pelo menos 6 caracteres."),
                ("duplicate_project_code", "O código de projeto '{value}' já está em uso."),
                ("empty_rejection_reason", "Informe um motivo para recusar o pedido de ausência."),
                ("invalid_approver", "O aprovador selecionado não pode aprovar este pedido."),
                ("invalid_status_transition", "Este pedido não pode mais ser alterado ({value})."),
                ("not_found", "{value} não encontrado."),
                ("permission_denied", "Você precisa da permissão '{value}' para realizar esta ação."),
                ("missing_company_context", "Contexto da empresa não encontrado."),
                ("email_already_exists", "Este e-mail já está em uso."),
                ("invalid_credentials", "E-mail ou senha inválidos."),
                ("invalid_token", "Token de autenticação inválido ou ausente."),
                ("user_not_found", "Usuário não encontrado."),
                ("unexpected", "Ocorreu um erro inesperado."),
            ]),
        );

        Self { messages }
    }

    pub fn translate(&self, lang: &str, key: &str) -> String {
        self.messages
            .get(lang)
            .and_then(|m| m.get(key))
            .or_else(|| self.messages.get(DEFAULT_LANG).and_then(|m| m.get(key)))
            .map(|s| s.to_string())
            .unwrap_or_else(|| key.to_string())
    }

    pub fn translate_with(&self, lang: &str, key: &str, value: &str) -> String {
        self.translate(lang, key).replace("{value}", value)
    }
}

impl Default for I18nStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn falls_back_to_english_then_key() {
        let store = I18nStore::new();
        assert_eq!(store.translate("pt", "required"), "Este campo é obrigatório.");
        assert_eq!(store.translate("fr", "required"), "This field is required.");
        assert_eq!(store.translate("en", "no_such_key"), "no_such_key");
    }

    #[test]
    fn interpolates_value() {
        let store = I18nStore::new();
        assert_eq!(
            store.translate_with("en", "duplicate_project_code", "P-001"),
            "Project code 'P-001' is already in use."
        );
    }
}
