/// Backend models the client offers in its picker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChatModel {
    #[default]
    DeepSeek,
    GptMini,
    Llama,
    Gemini,
    Mistral,
}

impl ChatModel {
    pub fn display_name(&self) -> &'static str {
        match self {
            ChatModel::DeepSeek => "DeepSeek V3.1",
            ChatModel::GptMini => "GPT-4o Mini",
            ChatModel::Llama => "Llama 3.3 70B",
            ChatModel::Gemini => "Gemini 2.0 Flash",
            ChatModel::Mistral => "Mistral Small",
        }
    }

    pub fn backend_id(&self) -> &'static str {
        match self {
            ChatModel::DeepSeek => "deepseek/deepseek-chat-v3.1",
            ChatModel::GptMini => "openai/gpt-4o-mini",
            ChatModel::Llama => "meta-llama/llama-3.3-70b-instruct",
            ChatModel::Gemini => "google/gemini-2.0-flash-001",
            ChatModel::Mistral => "mistralai/mistral-small-3.1-24b-instruct",
        }
    }

    pub fn all() -> Vec<ChatModel> {
        vec![
            ChatModel::DeepSeek,
            ChatModel::GptMini,
            ChatModel::Llama,
            ChatModel::Gemini,
            ChatModel::Mistral,
        ]
    }

    /// Look a model up by display name or backend id, ignoring case.
    pub fn lookup(s: &str) -> Option<Self> {
        let s = s.trim();
        Self::all().into_iter().find(|model| {
            model.display_name().eq_ignore_ascii_case(s) || model.backend_id().eq_ignore_ascii_case(s)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_by_name_and_id() {
        assert_eq!(ChatModel::lookup("gpt-4o mini"), Some(ChatModel::GptMini));
        assert_eq!(
            ChatModel::lookup("deepseek/deepseek-chat-v3.1"),
            Some(ChatModel::DeepSeek)
        );
        assert_eq!(ChatModel::lookup(" Gemini 2.0 Flash "), Some(ChatModel::Gemini));
        assert_eq!(ChatModel::lookup("gpt-5"), None);
    }

    #[test]
    fn test_first_model_is_default() {
        assert_eq!(ChatModel::all().first().copied(), Some(ChatModel::default()));
    }
}
