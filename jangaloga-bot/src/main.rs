mod config;
mod dispatch;
mod engines;
mod ffmpeg;
mod health;
mod telegram;

use config::AppConfig;
use dispatch::{Route, route};
use ffmpeg::FfmpegTranscoder;
use jangaloga::pipeline::{DeliveryChannel, Engines, ExclusiveSlot, Pipeline, messages};
use jangaloga::{JgError, Lexicon, Translator, morphology};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use telegram::TelegramClient;
use tracing::{error, info, warn};

const POLL_RETRY_DELAY: Duration = Duration::from_secs(3);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let dotenv = config::read_dotenv(Path::new(".env"))?;
    let level = std::env::var("LOG_LEVEL")
        .ok()
        .or_else(|| dotenv.get("LOG_LEVEL").cloned())
        .unwrap_or_else(|| "info".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level.to_lowercase())),
        )
        .init();

    let cfg = AppConfig::from_env(&dotenv)?;
    info!(config = ?cfg, "Starting Jangaloga bot");

    if !cfg.dict_path.exists() {
        return Err(JgError::Config(format!(
            "Lexicon not found: {}. Build it first: jangaloga build --out \"{}\"",
            cfg.dict_path.display(),
            cfg.dict_path.display()
        ))
        .into());
    }
    std::fs::create_dir_all(&cfg.data_dir)?;

    let lexicon = Lexicon::load(&cfg.dict_path)?;
    let translator = Translator::new(
        Arc::new(lexicon),
        morphology::select(cfg.lemma_table.as_deref()),
    );

    let client = Arc::new(TelegramClient::new(
        &cfg.bot_token,
        &cfg.api_url,
        cfg.telegram_timeout,
    )?);
    if let Err(e) = client.delete_webhook().await {
        warn!(error = %e, "Failed to delete webhook");
    }

    let engines = Engines {
        recognizer: Arc::new(engines::lazy_recognizer(&cfg.asr_command)?),
        synthesizer: Arc::new(engines::lazy_synthesizer(&cfg.tts_command)?),
        transcoder: Arc::new(FfmpegTranscoder::detect(&cfg.ffmpeg)),
    };
    let slot = ExclusiveSlot::new();
    let channel: Arc<dyn DeliveryChannel> = client.clone();
    let pipeline = Arc::new(Pipeline::new(
        cfg.pipeline_config(),
        translator,
        engines,
        channel,
        slot.clone(),
    ));

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", cfg.health_port)).await?;
    info!("Health server listening on port {}", cfg.health_port);
    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, health::router(slot)).await {
            error!(error = %e, "Health server stopped");
        }
    });

    poll(client, pipeline).await;
    Ok(())
}

/// Long-poll updates forever, handing each message to its own task
async fn poll(client: Arc<TelegramClient>, pipeline: Arc<Pipeline>) {
    let mut offset = 0;
    loop {
        let updates = match client.get_updates(offset).await {
            Ok(updates) => updates,
            Err(e) => {
                warn!(error = %e, "Polling failed");
                tokio::time::sleep(POLL_RETRY_DELAY).await;
                continue;
            }
        };

        for update in updates {
            offset = offset.max(update.update_id + 1);
            let Some(message) = update.message else {
                continue;
            };
            match route(&message) {
                Route::Help => {
                    let client = Arc::clone(&client);
                    let chat = message.chat.id;
                    tokio::spawn(async move {
                        if let Err(e) = client.send_text(chat, messages::HELP).await {
                            warn!(chat_id = chat, error = %e, "Failed to send help");
                        }
                    });
                }
                Route::Process(inbound) => {
                    let pipeline = Arc::clone(&pipeline);
                    tokio::spawn(async move {
                        pipeline.process(inbound).await;
                    });
                }
                Route::Ignore => {}
            }
        }
    }
}
