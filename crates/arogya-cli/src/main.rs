use clap::{Args, Parser, Subcommand, ValueEnum};
use eyre::Result;
use uuid::Uuid;

use arogya_core::models::intake::{IntakeKind, Locale};
use arogya_core::models::subject::Sex;

mod commands;

#[derive(Parser)]
#[command(name = "arogya", version, about = "Voice-first health intake on the terminal")]
struct Cli {
    /// Emit logs as JSON lines on stderr.
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run one intake session interactively.
    Intake(IntakeArgs),
    /// Clinician side of the escalation inbox.
    Review {
        #[command(subcommand)]
        action: ReviewCommand,
    },
    /// Inspect or create the config file.
    Config {
        #[command(subcommand)]
        action: ConfigCommand,
    },
}

#[derive(Args)]
pub struct IntakeArgs {
    #[arg(long, value_enum)]
    kind: KindArg,
    #[arg(long)]
    name: String,
    #[arg(long)]
    age: u32,
    #[arg(long, value_enum)]
    sex: SexArg,
    /// Answering for a family member or patient rather than yourself.
    #[arg(long)]
    dependent: bool,
    #[arg(long)]
    phone: Option<String>,
    #[arg(long)]
    location: Option<String>,
    /// Overrides the locale from the config file.
    #[arg(long, value_enum)]
    locale: Option<LocaleArg>,
    /// Answer with recorded audio files transcribed by Amazon Transcribe.
    #[arg(long)]
    voice: bool,
    /// Let the decision service drive triage instead of the fixed tree.
    #[arg(long)]
    dynamic: bool,
    /// After an escalation, wait this many seconds for a reviewer.
    #[arg(long, value_name = "SECS")]
    wait_response: Option<u64>,
}

#[derive(Subcommand)]
enum ReviewCommand {
    /// List escalations in the inbox.
    List {
        /// Only show escalations without a response.
        #[arg(long)]
        pending: bool,
    },
    /// Answer an escalation.
    Respond {
        id: Uuid,
        #[arg(long)]
        reviewer: String,
        #[arg(long)]
        message: String,
    },
}

#[derive(Subcommand)]
enum ConfigCommand {
    Show,
    Init {
        #[arg(long)]
        region: String,
        #[arg(long)]
        bucket: String,
        #[arg(long)]
        model_id: Option<String>,
        #[arg(long)]
        profile: Option<String>,
        #[arg(long, value_enum, default_value = "default")]
        locale: LocaleArg,
        /// Keep escalations in memory instead of S3.
        #[arg(long)]
        memory_inbox: bool,
        /// Observe reviewer responses by subscription instead of polling.
        #[arg(long)]
        push: bool,
        /// Overwrite an existing config file.
        #[arg(long)]
        force: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum KindArg {
    Triage,
    Nutrition,
    Escalation,
}

impl From<KindArg> for IntakeKind {
    fn from(arg: KindArg) -> Self {
        match arg {
            KindArg::Triage => IntakeKind::Triage,
            KindArg::Nutrition => IntakeKind::Nutrition,
            KindArg::Escalation => IntakeKind::Escalation,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum SexArg {
    M,
    F,
    O,
}

impl From<SexArg> for Sex {
    fn from(arg: SexArg) -> Self {
        match arg {
            SexArg::M => Sex::Male,
            SexArg::F => Sex::Female,
            SexArg::O => Sex::Other,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum LocaleArg {
    /// Hindi.
    Local,
    /// English.
    Default,
}

impl From<LocaleArg> for Locale {
    fn from(arg: LocaleArg) -> Self {
        match arg {
            LocaleArg::Local => Locale::Local,
            LocaleArg::Default => Locale::Default,
        }
    }
}

fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    init_tracing(cli.json_logs);

    match cli.command {
        Command::Intake(args) => commands::intake(args).await,
        Command::Review { action } => match action {
            ReviewCommand::List { pending } => commands::review_list(pending).await,
            ReviewCommand::Respond {
                id,
                reviewer,
                message,
            } => commands::review_respond(id, &reviewer, &message).await,
        },
        Command::Config { action } => match action {
            ConfigCommand::Show => commands::config_show(),
            ConfigCommand::Init {
                region,
                bucket,
                model_id,
                profile,
                locale,
                memory_inbox,
                push,
                force,
            } => commands::config_init(commands::InitOptions {
                region,
                bucket,
                model_id,
                profile,
                locale: locale.into(),
                memory_inbox,
                push,
                force,
            }),
        },
    }
}
