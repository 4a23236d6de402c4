/// Tokenizer models that can be resolved by id.
pub const SUPPORTED_TOKENIZERS: &[&str] = &[
    "Xenova/all-MiniLM-L6-v2",
    "Xenova/paraphrase-multilingual-MiniLM-L12-v2",
    "Xenova/bert-base-uncased",
    "Xenova/gpt2",
    "Xenova/roberta-base",
    "Xenova/all-distilroberta-v1",
    "Xenova/multilingual-e5-large",
    "Xenova/bert-base-multilingual-uncased",
    "Xenova/xlm-roberta-base",
    "BAAI/bge-base-en-v1.5",
];

pub fn is_supported(model_id: &str) -> bool {
    SUPPORTED_TOKENIZERS.contains(&model_id)
}
