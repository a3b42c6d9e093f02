use std::sync::Arc;
use std::time::Duration;

use eyre::Result;
use tracing::{info, warn};
use uuid::Uuid;

use arogya_audit::AuditEvent;
use arogya_cli::config::{self, ArogyaConfig, CredentialSource, InboxBackend, ResponseMode};
use arogya_cli::console::{ConsoleRecognizer, ConsoleSynthesizer, FileClipSource, InputLines};
use arogya_cli::aws;
use arogya_core::models::intake::{IntakeKind, Locale};
use arogya_core::models::outcome::SessionResult;
use arogya_core::models::subject::Subject;
use arogya_intake::capture::SpeechRecognizer;
use arogya_intake::capture::transcribe::TranscribeRecognizer;
use arogya_intake::escalation::memory::MemoryInbox;
use arogya_intake::escalation::s3::S3Inbox;
use arogya_intake::escalation::{EscalationDispatcher, EscalationInbox};
use arogya_intake::feedback::FeedbackEmitter;
use arogya_intake::policy::bedrock::BedrockDecisionService;
use arogya_intake::policy::dynamic::DynamicPolicy;
use arogya_intake::policy::follow_up::FollowUpPolicy;
use arogya_intake::policy::static_tree::StaticTriagePolicy;
use arogya_intake::policy::{BranchPolicy, Policies};
use arogya_intake::{SessionController, SessionState};

use crate::IntakeArgs;

pub async fn intake(args: IntakeArgs) -> Result<()> {
    let config = config::load_config()?;
    let settings = config.engine_settings();
    let sdk = aws::build_aws_config(&config.region, &config.credentials).await;
    let s3 = aws_sdk_s3::Client::new(&sdk);
    let lines = InputLines::stdin();

    let recognizer: Arc<dyn SpeechRecognizer> = if args.voice {
        let clips = Arc::new(FileClipSource::new(lines.clone(), s3.clone(), &config.bucket));
        Arc::new(
            TranscribeRecognizer::new(sdk.clone(), &config.bucket, clips)
                .with_polling(Duration::from_secs(2), settings.capture_timeout),
        )
    } else {
        Arc::new(ConsoleRecognizer::new(lines.clone()))
    };

    let inbox: Arc<dyn EscalationInbox> = match config.inbox {
        InboxBackend::Memory => Arc::new(MemoryInbox::new()),
        InboxBackend::S3 => Arc::new(S3Inbox::new(s3.clone(), &config.bucket)),
    };
    let dispatcher = Arc::new(EscalationDispatcher::new(inbox));

    let service = Arc::new(BedrockDecisionService::new(&sdk, &settings.model_id));
    let dynamic: Arc<dyn BranchPolicy> =
        Arc::new(DynamicPolicy::new(service, settings.decision_timeout));
    let policies = Policies {
        triage: if args.dynamic {
            dynamic.clone()
        } else {
            Arc::new(StaticTriagePolicy::standard())
        },
        nutrition: dynamic,
        escalation: Arc::new(FollowUpPolicy::default()),
    };

    let feedback = FeedbackEmitter::new(Arc::new(ConsoleSynthesizer::default()));
    let mut controller = SessionController::new(
        settings.clone(),
        recognizer,
        feedback.clone(),
        policies,
        dispatcher.clone(),
    );

    let mut subject = Subject::new(args.name, args.age, args.sex.into());
    if args.dependent {
        subject = subject.dependent();
    }
    if let Some(phone) = args.phone {
        subject = subject.with_phone(phone);
    }
    if let Some(location) = args.location {
        subject = subject.with_location(location);
    }
    let kind: IntakeKind = args.kind.into();
    let locale: Locale = args.locale.map(Into::into).unwrap_or(config.locale);

    controller.start(subject, kind, locale);

    loop {
        match controller.state() {
            SessionState::AwaitingInput if !controller.capture_in_flight() => {
                controller.begin_capture()?;
            }
            SessionState::Finished | SessionState::Selecting => break,
            _ => {}
        }

        let interrupted = tokio::select! {
            _ = tokio::signal::ctrl_c() => true,
            _ = controller.pump() => false,
        };
        if interrupted {
            controller.cancel();
            println!("\nSession cancelled.");
            return Ok(());
        }
    }

    controller.settle().await;
    // Let the spoken summary finish before printing the result.
    while feedback.is_speaking() {
        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    let Some(result) = controller.session().and_then(|s| s.result.clone()) else {
        return Ok(());
    };
    println!("{}", serde_json::to_string_pretty(&result)?);

    if !dispatcher.pending_retries().is_empty() {
        let published = dispatcher.retry_pending().await;
        let left = dispatcher.pending_retries().len();
        if left > 0 {
            warn!(published, left, "escalations could not be published");
        }
    }

    if let (SessionResult::Escalation(receipt), Some(secs)) = (&result, args.wait_response) {
        println!("Waiting up to {secs}s for a reviewer...");
        match dispatcher
            .await_response(receipt.id, &settings.response_delivery, Duration::from_secs(secs))
            .await
        {
            Ok(answered) => {
                if let Some(response) = answered.response {
                    println!("{} replied: {}", response.reviewer, response.message);
                }
            }
            Err(e) => println!("No reviewer response yet ({e})."),
        }
    }

    Ok(())
}

async fn s3_inbox(config: &ArogyaConfig) -> Result<S3Inbox> {
    if config.inbox != InboxBackend::S3 {
        return Err(eyre::eyre!(
            "review commands need the S3 inbox; run `arogya config init` without --memory-inbox"
        ));
    }
    let sdk = aws::build_aws_config(&config.region, &config.credentials).await;
    Ok(S3Inbox::new(aws_sdk_s3::Client::new(&sdk), &config.bucket))
}

pub async fn review_list(pending_only: bool) -> Result<()> {
    let config = config::load_config()?;
    let inbox = s3_inbox(&config).await?;

    let receipts = inbox.list().await?;
    let shown: Vec<_> = receipts
        .into_iter()
        .filter(|r| !pending_only || r.is_pending())
        .collect();

    if shown.is_empty() {
        println!("No escalations.");
        return Ok(());
    }
    for receipt in shown {
        let status = if receipt.is_pending() { "PENDING" } else { "RESPONDED" };
        println!(
            "{}  {:<9}  {}  {}",
            receipt.id, status, receipt.created_at, receipt.subject_contact.name
        );
        println!("    problem: {}", receipt.problem_description);
        for answer in &receipt.follow_up_answers {
            println!("    - {answer}");
        }
        if let Some(phone) = &receipt.subject_contact.phone {
            println!("    phone: {phone}");
        }
        if let Some(response) = &receipt.response {
            println!("    {} replied: {}", response.reviewer, response.message);
        }
    }
    Ok(())
}

pub async fn review_respond(id: Uuid, reviewer: &str, message: &str) -> Result<()> {
    let config = config::load_config()?;
    let inbox = s3_inbox(&config).await?;

    let receipt = inbox.respond(id, reviewer, message).await?;
    AuditEvent::escalation("escalation.responded", id, reviewer)
        .with_details(serde_json::json!({ "session_id": receipt.session_id }))
        .emit();
    info!(receipt_id = %id, reviewer, "response recorded");
    println!("Response recorded for {id}.");
    Ok(())
}

pub fn config_show() -> Result<()> {
    let path = config::config_path()?;
    if !config::has_config() {
        println!("No config at {}. Run `arogya config init`.", path.display());
        return Ok(());
    }
    let config = config::load_config()?;
    println!("# {}", path.display());
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}

pub struct InitOptions {
    pub region: String,
    pub bucket: String,
    pub model_id: Option<String>,
    pub profile: Option<String>,
    pub locale: Locale,
    pub memory_inbox: bool,
    pub push: bool,
    pub force: bool,
}

pub fn config_init(options: InitOptions) -> Result<()> {
    if config::has_config() && !options.force {
        return Err(eyre::eyre!(
            "config already exists at {}; pass --force to overwrite",
            config::config_path()?.display()
        ));
    }

    let mut config = ArogyaConfig::new(options.region, options.bucket);
    if let Some(model_id) = options.model_id {
        config.model_id = model_id;
    }
    if let Some(profile_name) = options.profile {
        config.credentials = CredentialSource::Profile { profile_name };
    }
    config.locale = options.locale;
    if options.memory_inbox {
        config.inbox = InboxBackend::Memory;
    }
    if options.push {
        config.response_delivery = ResponseMode::Push;
    }

    let path = config::save_config(&config)?;
    println!("Config written to {}.", path.display());
    Ok(())
}
