//! bazaar: marketplace chat client tooling
//!
//! Crypto:
//!   keygen                          - print a fresh base64 attachment key
//!   encrypt-text <text> [--key]     - encrypt a chat message
//!   decrypt-text <payload> --key    - decrypt a chat message
//!
//! Attachments (bearer token from the env var named by `api.token_env`):
//!   upload <chat> <file> [--key]    - encrypt and upload a file
//!   download <id> --key --name      - download, decrypt, save atomically
//!   delete <id> --chat              - delete an attachment
//!
//! Localization:
//!   translate <text> --to <lang>... - best-effort translation
//!   detect <text>                   - script-based language detection
//!   languages                       - list supported languages

use anyhow::{Context, Result};
use bazaar_attach::{AttachmentPipeline, HttpAttachmentApi, MessageListCache};
use bazaar_core::BazaarConfig;
use bazaar_crypto::AttachmentKey;
use bazaar_i18n::{LanguageDetector, TranslationEngine, LANGUAGES};
use clap::{Parser, Subcommand, ValueEnum};
use secrecy::SecretString;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

// ── CLI structure ──────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(
    name = "bazaar",
    version,
    about = "Marketplace chat client: encrypted attachments and translation"
)]
struct Cli {
    /// Path to bazaar.toml configuration file
    #[arg(long, short = 'c', env = "BAZAAR_CONFIG", default_value = "bazaar.toml")]
    config: PathBuf,

    /// Log level (overrides [logging].level; RUST_LOG overrides both)
    #[arg(long, env = "BAZAAR_LOG", global = true)]
    log: Option<String>,

    /// Log format (overrides [logging].format)
    #[arg(long, env = "BAZAAR_LOG_FORMAT", global = true)]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Debug, ValueEnum, PartialEq)]
enum LogFormat {
    Json,
    Text,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate a random 256-bit attachment key (base64)
    Keygen,

    /// Encrypt a text message; prints base64(nonce || ciphertext)
    #[command(name = "encrypt-text")]
    EncryptText {
        text: String,
        /// Base64 key (a fresh key is generated and printed when omitted)
        #[arg(long, short = 'k')]
        key: Option<String>,
    },

    /// Decrypt a base64 payload produced by encrypt-text
    #[command(name = "decrypt-text")]
    DecryptText {
        payload: String,
        #[arg(long, short = 'k')]
        key: String,
    },

    /// Encrypt a local file and upload it to a chat
    Upload {
        chat_id: String,
        file: PathBuf,
        /// Base64 key to encrypt under (generated when omitted)
        #[arg(long, short = 'k')]
        key: Option<String>,
    },

    /// Download and decrypt an attachment
    Download {
        attachment_id: String,
        /// The attachment record's encryptedKey
        #[arg(long, short = 'k')]
        key: String,
        /// File name to save as (directory components are stripped)
        #[arg(long, short = 'n')]
        name: String,
        /// Destination directory (default: [attachments].download_dir)
        #[arg(long, short = 'o')]
        out: Option<PathBuf>,
    },

    /// Delete an attachment
    Delete {
        attachment_id: String,
        /// Chat the attachment belongs to
        #[arg(long)]
        chat: String,
    },

    /// Translate text into one or more languages
    Translate {
        text: String,
        /// Target language code (repeatable)
        #[arg(long = "to", short = 't', required = true)]
        targets: Vec<String>,
        /// Source language code (detected when omitted)
        #[arg(long = "from", short = 'f')]
        source: Option<String>,
    },

    /// Detect the language of a text
    Detect {
        text: String,
        /// How many candidate languages to show
        #[arg(long, default_value_t = 3)]
        top: usize,
    },

    /// List supported languages
    Languages,

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Print the active configuration (merged defaults + config file)
    Show,
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    // [logging] lives in the config, so it is read before a subscriber exists
    let (config, from_file) = load_config(&cli.config)?;

    let (level, format) = log_settings(&cli, &config);
    init_logging(&level, &format);
    if !from_file {
        warn!(
            "config file not found: {}  (using defaults)",
            cli.config.display()
        );
    }
    debug!(
        version = env!("CARGO_PKG_VERSION"),
        config = %cli.config.display(),
        "bazaar starting"
    );

    match cli.command {
        Commands::Keygen => {
            println!("{}", bazaar_crypto::generate_key_b64());
            Ok(())
        }
        Commands::EncryptText { text, key } => cmd_encrypt_text(&text, key.as_deref()),
        Commands::DecryptText { payload, key } => {
            let plaintext =
                bazaar_crypto::decrypt_text(&payload, &key).context("decrypting message")?;
            println!("{plaintext}");
            Ok(())
        }
        Commands::Upload { chat_id, file, key } => {
            cmd_upload(&config, &chat_id, &file, key.as_deref()).await
        }
        Commands::Download {
            attachment_id,
            key,
            name,
            out,
        } => cmd_download(&config, &attachment_id, &key, &name, out.as_deref()).await,
        Commands::Delete {
            attachment_id,
            chat,
        } => {
            let pipeline = attachment_pipeline(&config)?;
            pipeline
                .delete_attachment(&attachment_id, &chat)
                .await
                .with_context(|| format!("deleting attachment {attachment_id}"))?;
            println!("deleted {attachment_id}");
            Ok(())
        }
        Commands::Translate {
            text,
            targets,
            source,
        } => cmd_translate(&config, &text, &targets, source.as_deref()).await,
        Commands::Detect { text, top } => cmd_detect(&text, top),
        Commands::Languages => {
            for lang in LANGUAGES {
                println!(
                    "{}  {:<4} {:<12} {}",
                    lang.flag, lang.code, lang.display_name, lang.native_name
                );
            }
            Ok(())
        }
        Commands::Config {
            action: ConfigAction::Show,
        } => cmd_config_show(&config, &cli.config),
    }
}

/// Configuration and whether it came from `path` (false: defaults).
fn load_config(path: &Path) -> Result<(BazaarConfig, bool)> {
    let from_file = path.exists();
    let config = BazaarConfig::load(path)
        .with_context(|| format!("loading config: {}", path.display()))?;
    Ok((config, from_file))
}

/// Log level and format: CLI flags first, then `[logging]`.
fn log_settings(cli: &Cli, config: &BazaarConfig) -> (String, LogFormat) {
    let level = cli
        .log
        .clone()
        .unwrap_or_else(|| config.logging.level.clone());
    let format = cli.log_format.clone().unwrap_or_else(|| {
        if config.logging.format.eq_ignore_ascii_case("json") {
            LogFormat::Json
        } else {
            LogFormat::Text
        }
    });
    (level, format)
}

fn init_logging(level: &str, format: &LogFormat) {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    // stdout carries command output; logs go to stderr
    match format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        LogFormat::Text => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }
}

// ── Attachment client from environment credentials ────────────────────────────

fn api_token(config: &BazaarConfig) -> Result<SecretString> {
    let var = &config.api.token_env;
    let token = std::env::var(var).with_context(|| {
        format!(
            "API token not set\n\
             Export the marketplace bearer token in {var}.\n\
             Example:\n\
             \texport {var}=your-token"
        )
    })?;
    Ok(SecretString::from(token))
}

fn attachment_pipeline(config: &BazaarConfig) -> Result<AttachmentPipeline> {
    let token = api_token(config)?;
    let api = HttpAttachmentApi::from_config(&config.api, token)
        .context("building attachment client")?;
    Ok(AttachmentPipeline::from_config(
        Arc::new(api),
        Arc::new(MessageListCache::new()),
        &config.attachments,
    ))
}

// ── `bazaar encrypt-text` ─────────────────────────────────────────────────────

fn cmd_encrypt_text(text: &str, key: Option<&str>) -> Result<()> {
    let key_b64 = match key {
        Some(k) => k.to_string(),
        None => {
            let k = bazaar_crypto::generate_key_b64();
            eprintln!("key: {k}");
            k
        }
    };
    let payload = bazaar_crypto::encrypt_text(text, &key_b64).context("encrypting message")?;
    println!("{payload}");
    Ok(())
}

// ── `bazaar upload` / `bazaar download` ───────────────────────────────────────

async fn cmd_upload(
    config: &BazaarConfig,
    chat_id: &str,
    file: &Path,
    key: Option<&str>,
) -> Result<()> {
    let key = key
        .map(AttachmentKey::from_b64)
        .transpose()
        .context("parsing --key")?;
    let pipeline = attachment_pipeline(config)?;

    info!(chat_id, file = %file.display(), "uploading attachment");
    let uploaded = pipeline
        .upload_attachment(chat_id, file, key.as_ref())
        .await
        .with_context(|| format!("uploading {}", file.display()))?;

    let rendered = serde_json::to_string_pretty(&uploaded.attachment)
        .context("serializing attachment record")?;
    println!("{rendered}");
    Ok(())
}

async fn cmd_download(
    config: &BazaarConfig,
    attachment_id: &str,
    key: &str,
    name: &str,
    out: Option<&Path>,
) -> Result<()> {
    let dest = out.unwrap_or(&config.attachments.download_dir);
    let pipeline = attachment_pipeline(config)?;

    let saved = pipeline
        .download_attachment(attachment_id, name, key, dest)
        .await
        .with_context(|| format!("downloading attachment {attachment_id}"))?;
    println!("{}", saved.display());
    Ok(())
}

// ── `bazaar translate` / `bazaar detect` ──────────────────────────────────────

async fn cmd_translate(
    config: &BazaarConfig,
    text: &str,
    targets: &[String],
    source: Option<&str>,
) -> Result<()> {
    let engine = TranslationEngine::from_config(&config.translation)
        .context("building translation engine")?;

    if let [target] = targets {
        let message = engine.create_translated_message(text, target, source).await;
        let rendered =
            serde_json::to_string_pretty(&message).context("serializing translation")?;
        println!("{rendered}");
        return Ok(());
    }

    let source = match source {
        Some(s) => s.to_string(),
        None => engine.detector().detect(text).to_string(),
    };
    let results = engine.translate_to_multiple(text, &source, targets).await;
    let rendered = serde_json::to_string_pretty(&results).context("serializing translations")?;
    println!("{rendered}");
    Ok(())
}

fn cmd_detect(text: &str, top: usize) -> Result<()> {
    let code = bazaar_i18n::detect_language(text);
    let confidence = bazaar_i18n::get_language_confidence(text);
    println!("{code} (confidence {confidence:.2})");
    for (lang, count) in bazaar_i18n::get_top_languages(text, top) {
        println!("  {lang:<4} {count}");
    }
    Ok(())
}

// ── `bazaar config show` ──────────────────────────────────────────────────────

fn cmd_config_show(config: &BazaarConfig, config_path: &Path) -> Result<()> {
    if config_path.exists() {
        println!("# Configuration from: {}", config_path.display());
    } else {
        println!(
            "# Configuration: defaults (no file at {})",
            config_path.display()
        );
    }
    println!();
    let rendered = toml::to_string_pretty(config).context("serializing config to TOML")?;
    print!("{rendered}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn translate_accepts_repeated_targets() {
        let cli = Cli::try_parse_from([
            "bazaar", "translate", "hello", "--to", "hi", "--to", "fr", "--from", "en",
        ])
        .unwrap();
        match cli.command {
            Commands::Translate {
                text,
                targets,
                source,
            } => {
                assert_eq!(text, "hello");
                assert_eq!(targets, vec!["hi", "fr"]);
                assert_eq!(source.as_deref(), Some("en"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn translate_requires_a_target() {
        assert!(Cli::try_parse_from(["bazaar", "translate", "hello"]).is_err());
    }

    #[test]
    fn download_parses_destination() {
        let cli = Cli::try_parse_from([
            "bazaar", "download", "att-1", "--key", "a2V5", "--name", "quote.pdf", "-o", "/tmp",
        ])
        .unwrap();
        assert!(matches!(
            cli.command,
            Commands::Download { ref out, .. } if out.as_deref() == Some(Path::new("/tmp"))
        ));
    }

    #[test]
    fn log_format_flag() {
        let cli = Cli::try_parse_from(["bazaar", "--log-format", "json", "languages"]).unwrap();
        assert_eq!(cli.log_format, Some(LogFormat::Json));
    }

    #[test]
    fn missing_config_file_is_reported_as_defaults() {
        let path = Path::new("/nonexistent/bazaar-cli-test/bazaar.toml");
        let (config, from_file) = load_config(path).unwrap();
        assert!(!from_file);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.api.token_env, "BAZAAR_API_TOKEN");
    }

    #[test]
    fn log_settings_prefer_flags_over_config() {
        let mut config = BazaarConfig::default();
        config.logging.level = "warn".into();
        config.logging.format = "JSON".into();

        let cli = Cli::try_parse_from(["bazaar", "languages"]).unwrap();
        let (level, format) = log_settings(&cli, &config);
        assert_eq!(level, "warn");
        assert_eq!(format, LogFormat::Json);

        let cli = Cli::try_parse_from([
            "bazaar", "--log", "debug", "--log-format", "text", "languages",
        ])
        .unwrap();
        let (level, format) = log_settings(&cli, &config);
        assert_eq!(level, "debug");
        assert_eq!(format, LogFormat::Text);
    }

    #[test]
    fn missing_token_env_is_reported() {
        let mut config = BazaarConfig::default();
        config.api.token_env = "BAZAAR_TEST_TOKEN_THAT_IS_NEVER_SET".into();
        let err = api_token(&config).unwrap_err();
        assert!(err.to_string().contains("API token not set"));
    }
}
