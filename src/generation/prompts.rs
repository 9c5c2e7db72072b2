use crate::models::{Character, GenerationRequest};

pub const STORY_SYSTEM_PROMPT: &str = "你是一个专业的言情小说作家，擅长创作浪漫的故事。";

pub const TRANSLATION_SYSTEM_PROMPT: &str =
    "你是一个专业的提示词翻译优化专家。请将用户的中文提示词翻译成英文，并针对AI绘画进行优化。保持简洁清晰。";

pub const STORY_TEMPERATURE: f64 = 0.7;

pub fn story_prompt(request: &GenerationRequest) -> String {
    let first = &request.character1;
    let second = &request.character2;
    format!(
        "创作一个关于{}({})和{}({})之间的浪漫故事。故事要富有感情，生动有趣。",
        first.name, first.background, second.name, second.background
    )
}

pub fn avatar_prompt(character: &Character) -> String {
    format!(
        "像素风，头像照片，{}，{}，正面特写",
        character.name, character.background
    )
}

pub fn couple_prompt(request: &GenerationRequest) -> String {
    let first = &request.character1;
    let second = &request.character2;
    format!(
        "浪漫的合照，{}和{}在一起的温馨场景，关于他们的介绍分别是：{}和{}",
        first.name, second.name, first.background, second.background
    )
}
