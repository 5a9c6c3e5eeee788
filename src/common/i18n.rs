pub const DEFAULT_LANG: &str = "en";

// (idioma, chave) -> mensagem
const MESSAGES: &[(&str, &str, &str)] = &[
    ("en", "validation", "One or more fields are invalid."),
    ("pt", "validation", "Um ou mais campos são inválidos."),
    ("en", "invalid_id", "Invalid identifier."),
    ("pt", "invalid_id", "Identificador inválido."),
    ("en", "invalid_cursor", "Invalid pagination cursor."),
    ("pt", "invalid_cursor", "Cursor de paginação inválido."),
    ("en", "invalid_token", "Invalid or missing authentication token."),
    ("pt", "invalid_token", "Token de autenticação inválido ou ausente."),
    ("en", "not_found", "Resource not found."),
    ("pt", "not_found", "Recurso não encontrado."),
    ("en", "forbidden", "You do not have access to this resource."),
    ("pt", "forbidden", "Você não tem acesso a este recurso."),
    ("en", "conflict", "The resource is in a conflicting state."),
    ("pt", "conflict", "O recurso está em um estado conflitante."),
    ("en", "business_rule", "The operation violates a business rule."),
    ("pt", "business_rule", "A operação viola uma regra de negócio."),
    ("en", "internal", "An unexpected error occurred."),
    ("pt", "internal", "Ocorreu um erro inesperado."),
];

/// Catálogo de mensagens de erro por idioma. Montado uma vez no `AppState`.
#[derive(Clone, Copy)]
pub struct I18nStore {
    messages: &'static [(&'static str, &'static str, &'static str)],
}

impl I18nStore {
    pub fn new() -> Self {
        Self { messages: MESSAGES }
    }

    pub fn supports(&self, lang: &str) -> bool {
        self.messages.iter().any(|(l, _, _)| *l == lang)
    }

    fn lookup(&self, lang: &str, key: &str) -> Option<&'static str> {
        self.messages
            .iter()
            .find(|(l, k, _)| *l == lang && *k == key)
            .map(|(_, _, msg)| *msg)
    }

    /// Idioma desconhecido cai para o inglês; chave desconhecida volta como está.
    pub fn translate(&self, lang: &str, key: &str) -> String {
        self.lookup(lang, key)
            .or_else(|| self.lookup(DEFAULT_LANG, key))
            .map(str::to_string)
            .unwrap_or_else(|| key.to_string())
    }
}

impl Default for I18nStore {
    fn default() -> Self {
        Self::new()
    }
}
