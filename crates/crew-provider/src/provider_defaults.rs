//! Built-in provider and model tables used before the remote catalog is consulted.

/// Remote catalog of model metadata keyed by model name.
pub const PROVIDER_CATALOG_URL: &str =
    "https://raw.githubusercontent.com/BerriAI/litellm/main/model_prices_and_context_window.json";

/// Provider served by the local inference daemon.
pub const LOCAL_PROVIDER: &str = "ollama";

/// Prefix every local model name carries once normalized.
pub const LOCAL_MODEL_PREFIX: &str = "ollama/";

/// Providers offered on the first menu, in display order.
pub const PREDEFINED_PROVIDERS: &[&str] = &[
    "openai",
    "anthropic",
    "gemini",
    "nvidia_nim",
    "groq",
    "huggingface",
    "ollama",
    "watson",
    "bedrock",
    "azure",
    "cerebras",
    "sambanova",
];

pub fn is_predefined_provider(provider: &str) -> bool {
    PREDEFINED_PROVIDERS
        .iter()
        .any(|candidate| candidate.eq_ignore_ascii_case(provider))
}

/// Static model list for a predefined provider. Unknown providers get an empty slice.
pub fn predefined_models(provider: &str) -> &'static [&'static str] {
    match provider.trim().to_ascii_lowercase().as_str() {
        "openai" => &[
            "gpt-4",
            "gpt-4.1",
            "gpt-4.1-mini-2025-04-14",
            "gpt-4.1-nano-2025-04-14",
            "gpt-4o",
            "gpt-4o-mini",
            "o1-mini",
            "o1-preview",
        ],
        "anthropic" => &[
            "claude-3-5-sonnet-20240620",
            "claude-3-sonnet-20240229",
            "claude-3-opus-20240229",
            "claude-3-haiku-20240307",
        ],
        "gemini" => &[
            "gemini/gemini-1.5-flash",
            "gemini/gemini-1.5-pro",
            "gemini/gemini-2.0-flash-lite-001",
            "gemini/gemini-2.0-flash-001",
            "gemini/gemini-2.0-flash-thinking-exp-01-21",
            "gemini/gemini-2.5-flash-preview-04-17",
            "gemini/gemini-2.5-pro-exp-03-25",
            "gemini/gemma-3-27b-it",
        ],
        "nvidia_nim" => &[
            "nvidia_nim/nvidia/mistral-nemo-minitron-8b-8k-instruct",
            "nvidia_nim/nvidia/nemotron-4-mini-hindi-4b-instruct",
            "nvidia_nim/nvidia/llama-3.1-nemotron-70b-instruct",
            "nvidia_nim/meta/llama-3.1-8b-instruct",
            "nvidia_nim/meta/llama-3.1-70b-instruct",
            "nvidia_nim/mistralai/mixtral-8x7b-instruct-v0.1",
            "nvidia_nim/google/gemma-2-9b-it",
        ],
        "groq" => &[
            "groq/llama-3.1-8b-instant",
            "groq/llama-3.1-70b-versatile",
            "groq/llama-3.1-405b-reasoning",
            "groq/gemma2-9b-it",
            "groq/gemma-7b-it",
        ],
        "huggingface" => &[
            "huggingface/meta-llama/Meta-Llama-3.1-8B-Instruct",
            "huggingface/mistralai/Mixtral-8x7B-Instruct-v0.1",
            "huggingface/tiiuae/falcon-180B-chat",
            "huggingface/google/gemma-7b-it",
        ],
        "ollama" => &["ollama/llama3.1", "ollama/mixtral"],
        "watson" => &[
            "watsonx/meta-llama/llama-3-1-70b-instruct",
            "watsonx/meta-llama/llama-3-1-8b-instruct",
            "watsonx/meta-llama/llama-3-2-11b-vision-instruct",
            "watsonx/ibm/granite-3-8b-instruct",
            "watsonx/mistralai/mistral-large",
        ],
        "bedrock" => &[
            "bedrock/us.anthropic.claude-3-7-sonnet-20250219-v1:0",
            "bedrock/anthropic.claude-3-5-sonnet-20240620-v1:0",
            "bedrock/anthropic.claude-3-haiku-20240307-v1:0",
            "bedrock/amazon.nova-pro-v1:0",
            "bedrock/amazon.titan-text-express-v1",
            "bedrock/meta.llama3-1-70b-instruct-v1:0",
            "bedrock/mistral.mistral-large-2407-v1:0",
        ],
        "azure" => &["azure/gpt-4o", "azure/gpt-4o-mini", "azure/gpt-4.1"],
        "cerebras" => &[
            "cerebras/llama3.1-8b",
            "cerebras/llama3.1-70b",
            "cerebras/llama-3.3-70b",
        ],
        "sambanova" => &[
            "sambanova/Meta-Llama-3.3-70B-Instruct",
            "sambanova/QwQ-32B-Preview",
            "sambanova/Qwen2.5-72B-Instruct",
            "sambanova/Meta-Llama-3.1-8B-Instruct",
        ],
        _ => &[],
    }
}

/// Prefixes a local model name with `ollama/` unless it already carries the prefix.
pub fn normalize_local_model_name(model: &str) -> String {
    let trimmed = model.trim();
    let already_prefixed = trimmed
        .get(..LOCAL_MODEL_PREFIX.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(LOCAL_MODEL_PREFIX));
    if already_prefixed {
        trimmed.to_string()
    } else {
        format!("{LOCAL_MODEL_PREFIX}{trimmed}")
    }
}
