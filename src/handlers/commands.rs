use std::io::{self, BufRead, Write};

use anyhow::{anyhow, Result};
use tracing::info;

use crate::generation::GenerationClient;
use crate::llm::Transport;
use crate::models::{Character, EffectiveConfig, GenerationRequest, GenerationResult};
use crate::settings::{ConfigOverrides, ConfigResolver, SettingsStore};
use crate::state::{GenerationSession, Outcome, SessionView};
use crate::utils::logging::mask_secret;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateArgs {
    pub request: GenerationRequest,
    pub json: bool,
    pub interactive: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Generate(GenerateArgs),
    SettingsShow,
    SettingsSet(ConfigOverrides),
    Help,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedArgs {
    pub command: Command,
    pub password: Option<String>,
}

pub fn usage() -> &'static str {
    "万物CP: 让AI为你创造独特的CP故事

Usage:
  cp_generator generate --name1 <名称> --background1 <背景说明> --name2 <名称> --background2 <背景说明> [--json] [--interactive] [--password <密码>]
  cp_generator settings show [--password <密码>]
  cp_generator settings set [--api-key <key>] [--base-url <url>] [--model <model>] [--image-model <model>] [--silicon-flow <true|false>] [--silicon-flow-key <key>] [--password <密码>]
  cp_generator help"
}

fn take_value<'a>(args: &'a [String], index: &mut usize, flag: &str) -> Result<&'a str> {
    *index += 1;
    args.get(*index)
        .map(|value| value.as_str())
        .ok_or_else(|| anyhow!("Missing value for {flag}"))
}

fn parse_bool_flag(value: &str, flag: &str) -> Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "on" | "yes" | "1" => Ok(true),
        "false" | "off" | "no" | "0" => Ok(false),
        _ => Err(anyhow!("Invalid {flag} value: {value}")),
    }
}

/// `args[0]` is the program name.
pub fn parse_args(args: &[String]) -> Result<ParsedArgs> {
    let mut password = None;
    let mut rest: Vec<String> = Vec::new();
    let mut index = 1;
    while index < args.len() {
        if args[index] == "--password" {
            password = Some(take_value(args, &mut index, "--password")?.to_string());
        } else {
            rest.push(args[index].clone());
        }
        index += 1;
    }

    let command = match rest.first().map(|value| value.as_str()) {
        None | Some("help") | Some("--help") | Some("-h") => Command::Help,
        Some("generate") => Command::Generate(parse_generate_args(&rest)?),
        Some("settings") => match rest.get(1).map(|value| value.as_str()) {
            Some("show") => Command::SettingsShow,
            Some("set") => Command::SettingsSet(parse_settings_set_args(&rest)?),
            other => {
                return Err(anyhow!(
                    "Unknown settings action: {}\n{}",
                    other.unwrap_or("(none)"),
                    usage()
                ))
            }
        },
        Some(other) => return Err(anyhow!("Unknown command: {other}\n{}", usage())),
    };

    Ok(ParsedArgs { command, password })
}

fn parse_generate_args(args: &[String]) -> Result<GenerateArgs> {
    let mut first = Character::new("", "");
    let mut second = Character::new("", "");
    let mut json = false;
    let mut interactive = false;

    let mut index = 1;
    while index < args.len() {
        match args[index].as_str() {
            "--name1" => first.name = take_value(args, &mut index, "--name1")?.to_string(),
            "--background1" => {
                first.background = take_value(args, &mut index, "--background1")?.to_string()
            }
            "--name2" => second.name = take_value(args, &mut index, "--name2")?.to_string(),
            "--background2" => {
                second.background = take_value(args, &mut index, "--background2")?.to_string()
            }
            "--json" => json = true,
            "--interactive" | "-i" => interactive = true,
            other => {
                return Err(anyhow!(
                    "Unknown generate argument: {other}\n{}",
                    usage()
                ))
            }
        }
        index += 1;
    }

    let request = GenerationRequest::new(first, second);
    request.validate()?;
    Ok(GenerateArgs {
        request,
        json,
        interactive,
    })
}

fn parse_settings_set_args(args: &[String]) -> Result<ConfigOverrides> {
    let mut overrides = ConfigOverrides::default();

    let mut index = 2;
    while index < args.len() {
        let flag = args[index].as_str();
        match flag {
            "--api-key" => overrides.api_key = Some(take_value(args, &mut index, flag)?.to_string()),
            "--base-url" => {
                overrides.api_base_url = Some(take_value(args, &mut index, flag)?.to_string())
            }
            "--model" => overrides.text_model = Some(take_value(args, &mut index, flag)?.to_string()),
            "--image-model" => {
                overrides.image_model = Some(take_value(args, &mut index, flag)?.to_string())
            }
            "--silicon-flow" => {
                let value = take_value(args, &mut index, flag)?;
                overrides.use_alternate_provider = Some(parse_bool_flag(value, flag)?);
            }
            "--silicon-flow-key" => {
                overrides.alternate_provider_key =
                    Some(take_value(args, &mut index, flag)?.to_string())
            }
            other => {
                return Err(anyhow!(
                    "Unknown settings set argument: {other}\n{}",
                    usage()
                ))
            }
        }
        index += 1;
    }

    if overrides.is_empty() {
        return Err(anyhow!("settings set needs at least one option\n{}", usage()));
    }
    Ok(overrides)
}

pub fn render_result(request: &GenerationRequest, result: &GenerationResult) -> String {
    format!(
        "== 万物CP ==\n{} 的头像: {}\n{} 的头像: {}\n\n{}\n\n开磕! CP 合照: {}\n",
        request.character1.name,
        result.avatars.character1,
        request.character2.name,
        result.avatars.character2,
        result.story,
        result.cp_image
    )
}

pub fn render_settings(config: &EffectiveConfig) -> String {
    format!(
        "API Key: {}\nAPI Base URL: {}\n文本模型: {}\n图像模型: {}\n使用硅基流动生成图像: {}\n硅基流动 API Key: {}\n",
        mask_secret(&config.api_key),
        config.api_base_url,
        config.text_model,
        config.image_model,
        if config.use_alternate_provider { "是" } else { "否" },
        mask_secret(&config.alternate_provider_key)
    )
}

/// What a session view prints: an error line for stderr and the result for
/// stdout. The error is left out when the caller reports it instead.
#[derive(Debug, Default, PartialEq, Eq)]
struct ViewOutput {
    error: Option<String>,
    body: Option<String>,
}

fn render_view(view: SessionView, json: bool, report_error: bool) -> Result<ViewOutput> {
    let error = view.error.filter(|_| report_error);
    let body = match (view.characters, view.result) {
        (Some(_), Some(result)) if json => Some(format!(
            "{}\n",
            serde_json::to_string_pretty(&result)?
        )),
        (Some(request), Some(result)) => Some(render_result(&request, &result)),
        _ => None,
    };
    Ok(ViewOutput { error, body })
}

fn print_view(session: &GenerationSession, json: bool, report_error: bool) -> Result<()> {
    let output = render_view(session.snapshot(), json, report_error)?;
    if let Some(error) = output.error {
        eprintln!("{error}");
    }
    if let Some(body) = output.body {
        print!("{body}");
    }
    Ok(())
}

fn prompt_regenerate() -> Result<bool> {
    loop {
        print!("[r] 重新生成  [q] 退出: ");
        io::stdout().flush()?;
        let mut line = String::new();
        if io::stdin().lock().read_line(&mut line)? == 0 {
            return Ok(false);
        }
        match line.trim() {
            "r" | "R" => return Ok(true),
            "q" | "Q" | "" => return Ok(false),
            _ => continue,
        }
    }
}

pub async fn run_generate<T: Transport, S: SettingsStore>(
    client: &GenerationClient<T>,
    resolver: &ConfigResolver<S>,
    args: GenerateArgs,
) -> Result<()> {
    let session = GenerationSession::new();
    let outcome = session
        .submit(client, &resolver.resolve(), args.request)
        .await;
    // a non-interactive failure is printed by the caller
    print_view(&session, args.json, args.interactive)?;
    if outcome == Outcome::Failed && !args.interactive {
        return Err(anyhow!(session.snapshot().error.unwrap_or_default()));
    }

    while args.interactive && prompt_regenerate()? {
        info!("Regenerating with the same characters");
        session.regenerate(client, &resolver.resolve()).await;
        print_view(&session, args.json, true)?;
    }
    Ok(())
}

pub fn run_settings_show<S: SettingsStore>(resolver: &ConfigResolver<S>) {
    print!("{}", render_settings(&resolver.resolve()));
}

pub fn run_settings_set<S: SettingsStore>(
    resolver: &ConfigResolver<S>,
    overrides: ConfigOverrides,
) -> Result<()> {
    let config = resolver.update(overrides)?;
    println!("设置已保存");
    print!("{}", render_settings(&config));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigDefaults;
    use crate::llm::ProviderSettings;
    use crate::settings::MemorySettingsStore;
    use crate::testing::{sample_request, FakeTransport};

    fn argv(parts: &[&str]) -> Vec<String> {
        std::iter::once("cp_generator")
            .chain(parts.iter().copied())
            .map(|part| part.to_string())
            .collect()
    }

    #[test]
    fn parses_generate_with_password_anywhere() {
        let parsed = parse_args(&argv(&[
            "--password",
            "secret",
            "generate",
            "--name1",
            "小明",
            "--background1",
            "程序员",
            "--name2",
            "小红",
            "--background2",
            "设计师",
            "--json",
        ]))
        .unwrap();

        assert_eq!(parsed.password.as_deref(), Some("secret"));
        assert_eq!(
            parsed.command,
            Command::Generate(GenerateArgs {
                request: sample_request(),
                json: true,
                interactive: false,
            })
        );
    }

    #[test]
    fn generate_rejects_missing_fields_before_any_request() {
        let err = parse_args(&argv(&["generate", "--name1", "小明", "--background1", "程序员"]))
            .unwrap_err();
        assert_eq!(err.to_string(), "角色2的名称不能为空");
    }

    #[test]
    fn parses_settings_set() {
        let parsed = parse_args(&argv(&[
            "settings",
            "set",
            "--api-key",
            "sk-test",
            "--silicon-flow",
            "true",
        ]))
        .unwrap();
        assert_eq!(
            parsed.command,
            Command::SettingsSet(ConfigOverrides {
                api_key: Some("sk-test".to_string()),
                use_alternate_provider: Some(true),
                ..ConfigOverrides::default()
            })
        );

        assert!(parse_args(&argv(&["settings", "set"])).is_err());
        assert!(parse_args(&argv(&["settings", "set", "--silicon-flow", "maybe"])).is_err());
    }

    #[test]
    fn no_arguments_means_help() {
        assert_eq!(parse_args(&argv(&[])).unwrap().command, Command::Help);
        assert!(parse_args(&argv(&["dance"])).is_err());
    }

    #[test]
    fn settings_render_masks_keys() {
        let rendered = render_settings(&EffectiveConfig {
            api_key: "sk-1234567890abcd".to_string(),
            api_base_url: "https://api.openai.com/v1".to_string(),
            text_model: "gpt-4o-mini".to_string(),
            image_model: "dall-e-3".to_string(),
            use_alternate_provider: false,
            alternate_provider_key: String::new(),
        });
        assert!(rendered.contains("sk-1...abcd"));
        assert!(!rendered.contains("sk-1234567890abcd"));
        assert!(rendered.contains("(未设置)"));
    }

    #[tokio::test]
    async fn generate_command_fails_with_provider_message() {
        let client = GenerationClient::new(
            FakeTransport::new(|_, _| {
                (
                    crate::testing::reply(
                        reqwest::StatusCode::INTERNAL_SERVER_ERROR,
                        serde_json::json!({ "error": { "message": "生成故事失败" } }),
                    ),
                    0,
                )
            }),
            ProviderSettings::default(),
        );
        let resolver = ConfigResolver::load(ConfigDefaults::default(), MemorySettingsStore::new());

        let err = run_generate(
            &client,
            &resolver,
            GenerateArgs {
                request: sample_request(),
                json: true,
                interactive: false,
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.to_string(), "生成故事失败");
    }

    #[tokio::test]
    async fn generate_command_uses_saved_settings() {
        let client = GenerationClient::new(FakeTransport::succeeding(), ProviderSettings::default());
        let resolver = ConfigResolver::load(ConfigDefaults::default(), MemorySettingsStore::new());
        run_settings_set(
            &resolver,
            ConfigOverrides {
                api_key: Some("sk-saved".to_string()),
                ..ConfigOverrides::default()
            },
        )
        .unwrap();

        run_generate(
            &client,
            &resolver,
            GenerateArgs {
                request: sample_request(),
                json: false,
                interactive: false,
            },
        )
        .await
        .unwrap();

        assert!(client
            .transport()
            .calls()
            .iter()
            .all(|call| call.bearer == "sk-saved"));
    }

    #[test]
    fn failed_view_leaves_error_to_caller_unless_asked() {
        let view = SessionView {
            characters: Some(sample_request()),
            result: None,
            error: Some("生成故事失败".to_string()),
            loading: false,
        };

        let silent = render_view(view.clone(), false, false).unwrap();
        assert_eq!(silent, ViewOutput::default());

        let reported = render_view(view, false, true).unwrap();
        assert_eq!(reported.error.as_deref(), Some("生成故事失败"));
        assert_eq!(reported.body, None);
    }
}
