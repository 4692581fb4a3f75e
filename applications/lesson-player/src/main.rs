/// Lesson Player - playback engine host and telemetry replay tool
use anyhow::Context;
use clap::{Parser, Subcommand};
use lesson_core::{CourseId, LessonId};
use lesson_player::{
    commands::{self, ReplayOptions},
    replay::read_events,
    AppConfig,
};
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "lesson-player")]
#[command(about = "Lesson video playback engine host", long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true, env = "LESSON_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the embed URL for a video
    EmbedUrl {
        /// Video id
        video_id: String,
        /// Start position in seconds
        #[arg(long)]
        start: Option<f64>,
        #[arg(long)]
        autoplay: bool,
        #[arg(long)]
        muted: bool,
    },
    /// Feed a JSONL recording of player events through a session
    Replay {
        /// Recording file, one event object per line
        file: PathBuf,
        /// Lesson the recording belongs to
        #[arg(short, long)]
        lesson: String,
        #[arg(long)]
        course: Option<String>,
        /// Video id used for the embed URL
        #[arg(long, default_value = "replay")]
        video_id: String,
        /// Send heartbeats to the configured backend
        #[arg(long)]
        send: bool,
    },
    /// Inspect or clear saved progress
    Progress {
        #[command(subcommand)]
        action: ProgressAction,
    },
    /// Show whether the resume banner would appear for a lesson
    ResumeCheck {
        /// Lesson id
        lesson: String,
    },
}

#[derive(Subcommand)]
enum ProgressAction {
    /// Print the saved progress record
    Show { lesson: String },
    /// Remove the saved progress record
    Clear { lesson: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so command output stays pipeable
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lesson_player=info,lesson_playback=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = AppConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::EmbedUrl {
            video_id,
            start,
            autoplay,
            muted,
        } => {
            let url = commands::embed_url(&config, &video_id, start, autoplay, muted)?;
            println!("{}", url);
            println!("resolvable: {}", url.is_resolvable());
        }
        Commands::Replay {
            file,
            lesson,
            course,
            video_id,
            send,
        } => {
            let reader = File::open(&file)
                .with_context(|| format!("Failed to open recording {}", file.display()))?;
            let events = read_events(BufReader::new(reader))?;

            let outcome = commands::replay(
                &config,
                events,
                ReplayOptions {
                    lesson: LessonId::new(lesson),
                    course: course.map(CourseId::new),
                    video_id,
                    send,
                },
            )
            .await?;

            for signal in &outcome.signals {
                println!("{}", serde_json::to_string(signal)?);
            }
            if let Some(report) = outcome.dispatch {
                tracing::info!(
                    delivered = report.delivered,
                    dropped = report.dropped,
                    "Heartbeats flushed"
                );
            }
        }
        Commands::Progress { action } => match action {
            ProgressAction::Show { lesson } => {
                match commands::show_progress(&config, &LessonId::new(lesson))? {
                    Some(record) => println!("{}", serde_json::to_string_pretty(&record)?),
                    None => println!("No saved progress"),
                }
            }
            ProgressAction::Clear { lesson } => {
                commands::clear_progress(&config, &LessonId::new(lesson))?;
            }
        },
        Commands::ResumeCheck { lesson } => {
            let check = commands::resume_check(&config, &LessonId::new(lesson))?;
            println!("{}", serde_json::to_string_pretty(&check)?);
        }
    }

    Ok(())
}
