use std::collections::HashMap;
use std::sync::Arc;

use chrono::{Local, Utc};
use tracing::{debug, error, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::ai::{backend_from_settings, build_prompt, parse_response, ModelBackend, ModelError};
use crate::categorizer::FolderMatcher;
use crate::config::{Settings, SettingsStore};
use crate::email::host::{Account, FolderNode, MailHost, MessageHeader};
use crate::email::tracker::{MessageTracker, ProcessedIdSet, ProcessedMessage, RunRow};
use crate::error::Result;
use crate::folder::{find_folder_by_path, format_folder_catalogue, FolderAddress, FolderResolver};

use super::context::{FolderLedger, MessageOutcome, RunLedger, SkipReason};
use super::error::PipelineError;
use super::report::{report_body, report_subject, MessageSummaryRecord, RunOutcome, RunReport};

/// Inputs shared by every message of a run, computed once at run start.
struct RunInputs {
    catalogue: String,
    matcher: FolderMatcher,
    account_names: HashMap<String, String>,
}

impl RunInputs {
    fn display_name<'a>(&'a self, account_id: &'a str) -> &'a str {
        self.account_names
            .get(account_id)
            .map(String::as_str)
            .unwrap_or(account_id)
    }
}

/// Drives one batch run over all configured source folders.
///
/// Messages are handled one after another. A failing message or folder adds an
/// entry to the run's error list and the run goes on; only loading the
/// processed set can abort it.
pub struct BatchRunner {
    settings: Settings,
    host: Arc<dyn MailHost>,
    backend: Arc<dyn ModelBackend>,
    tracker: MessageTracker,
}

impl BatchRunner {
    pub fn new(
        settings: Settings,
        host: Arc<dyn MailHost>,
        backend: Arc<dyn ModelBackend>,
        tracker: MessageTracker,
    ) -> Self {
        Self {
            settings,
            host,
            backend,
            tracker,
        }
    }

    /// Builds the model backend from `settings`.
    pub fn from_settings(
        settings: Settings,
        host: Arc<dyn MailHost>,
        tracker: MessageTracker,
    ) -> std::result::Result<Self, ModelError> {
        let backend: Arc<dyn ModelBackend> = Arc::from(backend_from_settings(&settings)?);
        Ok(Self::new(settings, host, backend, tracker))
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub async fn run(&self) -> Result<RunReport> {
        let run_id = Uuid::new_v4().to_string();
        let span = info_span!("batch_run", run_id = %run_id);
        self.run_inner(run_id).instrument(span).await
    }

    async fn run_inner(&self, run_id: String) -> Result<RunReport> {
        let started_at = Utc::now();
        let mut processed = self.tracker.load_processed()?;
        let mut ledger = RunLedger::default();

        info!(
            "Starting batch run over {} source folders ({} already processed)",
            self.settings.source_folders.len(),
            processed.len()
        );

        let accounts = match self.host.list_accounts().await {
            Ok(accounts) => accounts,
            Err(e) => {
                error!("Failed to list accounts: {}", e);
                ledger.push_error(format!("Failed to list accounts: {}", e));
                Vec::new()
            }
        };
        let inputs = self.prepare_inputs(&accounts);

        for source in self.settings.source_addresses() {
            let span = info_span!("source_folder", folder = %source);
            let folder_ledger = self
                .process_source_folder(&source, &inputs, &mut processed)
                .instrument(span)
                .await;
            ledger.merge(folder_ledger);
        }

        let report = self.finish(run_id, ledger).await;
        self.record_run(&report, started_at);

        info!(
            "Batch run finished: {} processed, {} errors",
            report.outcome.processed_count, report.outcome.error_count
        );
        Ok(report)
    }

    fn prepare_inputs(&self, accounts: &[Account]) -> RunInputs {
        let targets = self.settings.target_addresses();
        let catalogue = format_folder_catalogue(&targets, accounts);
        debug!("Folder catalogue:\n{}", catalogue);

        RunInputs {
            catalogue,
            matcher: FolderMatcher::new(targets),
            account_names: accounts
                .iter()
                .map(|a| (a.id.clone(), a.name.clone()))
                .collect(),
        }
    }

    async fn process_source_folder(
        &self,
        source: &FolderAddress,
        inputs: &RunInputs,
        processed: &mut ProcessedIdSet,
    ) -> FolderLedger {
        let folder = match self.locate_source(source).await {
            Ok(folder) => folder,
            Err(e) => {
                warn!("Skipping source folder {}: {}", source, e);
                return FolderLedger::failed(format!("Error processing folder {}: {}", source, e));
            }
        };

        let messages = match self.host.list_messages(&folder).await {
            Ok(messages) => messages,
            Err(e) => {
                warn!("Failed to list messages of {}: {}", folder.path, e);
                return FolderLedger::failed(format!(
                    "Error fetching messages from {}: {}",
                    folder.path, e
                ));
            }
        };
        info!("Processing {} messages in {}", messages.len(), folder.path);

        let mut ledger = FolderLedger::default();
        for message in &messages {
            let outcome = self
                .process_message(message, source, inputs, processed)
                .instrument(info_span!("message", id = %message.id))
                .await;
            ledger.record(outcome);
        }
        ledger
    }

    async fn locate_source(&self, source: &FolderAddress) -> std::result::Result<FolderNode, PipelineError> {
        let account = self
            .host
            .get_account(source.account_id())
            .await?
            .ok_or_else(|| PipelineError::AccountNotFound(source.account_id().to_string()))?;
        let tree = self.host.folder_tree(&account).await?;
        find_folder_by_path(&tree, source.normalized_path())
            .cloned()
            .ok_or_else(|| PipelineError::FolderNotFound(source.to_string()))
    }

    async fn process_message(
        &self,
        message: &MessageHeader,
        source: &FolderAddress,
        inputs: &RunInputs,
        processed: &mut ProcessedIdSet,
    ) -> MessageOutcome {
        if processed.contains(&message.id) {
            debug!("Skipping already processed message: {}", message.subject);
            return MessageOutcome::Skipped(SkipReason::AlreadyProcessed);
        }

        match self.classify_and_move(message, source, inputs).await {
            Ok(outcome @ (MessageOutcome::Moved(_) | MessageOutcome::MovedUnrecorded { .. })) => {
                processed.insert(message.id.clone());
                outcome
            }
            Ok(outcome) => outcome,
            Err(e @ PipelineError::NoMatch { .. }) => {
                warn!("{}", e);
                MessageOutcome::Failed(e.to_string())
            }
            Err(e) => {
                error!("Error processing \"{}\": {}", message.subject, e);
                MessageOutcome::Failed(format!("Error processing \"{}\": {}", message.subject, e))
            }
        }
    }

    async fn classify_and_move(
        &self,
        message: &MessageHeader,
        source: &FolderAddress,
        inputs: &RunInputs,
    ) -> std::result::Result<MessageOutcome, PipelineError> {
        let details = self.host.message_details(&message.id).await?;
        if self.settings.unread_only && details.read {
            debug!("Skipping read message: {}", message.subject);
            return Ok(MessageOutcome::Skipped(SkipReason::Read));
        }

        info!("Processing message: {}", message.subject);
        let content = self.host.message_content(&message.id).await?;
        debug!("Message content length: {}", content.len());

        let prompt = build_prompt(&self.settings.processing_prompt, &content, &inputs.catalogue)?;
        debug!("Prompt built, length: {}", prompt.len());

        let answer = self.backend.generate(&prompt).await?;
        debug!("Model answer received from {}, length: {}", self.backend.name(), answer.len());

        let parsed = parse_response(&answer);
        let target = inputs
            .matcher
            .match_target(&parsed.target_folder)
            .ok_or_else(|| PipelineError::NoMatch {
                subject: message.subject.clone(),
            })?;

        let node = FolderResolver::new(self.host.as_ref())
            .resolve(&target)
            .await?
            .ok_or_else(|| PipelineError::FolderNotFound(target.to_string()))?;

        self.host.move_message(&message.id, &node).await?;
        info!("Moved message to {}", node.path);

        let summary = MessageSummaryRecord {
            from: message.author.clone(),
            subject: message.subject.clone(),
            moved_to: format!("{} - {}", inputs.display_name(target.account_id()), node.path),
            parsed,
        };

        let recorded = self.tracker.mark_processed(&ProcessedMessage {
            id: &message.id,
            source_folder: &source.token(),
            target_folder: &target.token(),
            subject: &message.subject,
        });
        if let Err(e) = recorded {
            let e = PipelineError::from(e);
            error!("Error processing \"{}\": {}", message.subject, e);
            return Ok(MessageOutcome::MovedUnrecorded {
                summary,
                error: format!("Error processing \"{}\": {}", message.subject, e),
            });
        }

        Ok(MessageOutcome::Moved(summary))
    }

    /// Builds the report and stores it into the summary folder.
    ///
    /// Failures to store it are appended to the error list after the body was
    /// built, so they count in the outcome but are not in the draft.
    async fn finish(&self, run_id: String, ledger: RunLedger) -> RunReport {
        let RunLedger {
            summaries,
            mut errors,
            skipped,
        } = ledger;
        debug!("{} messages skipped", skipped);

        let subject = report_subject(Local::now());
        let body = report_body(&summaries, &errors);

        if let Err(e) = self.store_report(&subject, &body).await {
            error!("{}", e);
            errors.push(e.to_string());
        }

        RunReport {
            run_id,
            subject,
            body,
            outcome: RunOutcome::new(summaries.len(), errors.len()),
            errors,
        }
    }

    async fn store_report(&self, subject: &str, body: &str) -> std::result::Result<(), PipelineError> {
        let address = self
            .settings
            .summary_address()
            .ok_or_else(|| PipelineError::Report("no summary folder configured".to_string()))?;

        let folder = FolderResolver::new(self.host.as_ref())
            .resolve(&address)
            .await
            .map_err(|e| PipelineError::Report(e.to_string()))?
            .ok_or_else(|| PipelineError::Report(format!("summary folder not found: {}", address)))?;

        let draft = crate::email::Draft {
            subject: subject.to_string(),
            body: body.to_string(),
        };
        self.host
            .store_draft(&draft, &folder)
            .await
            .map_err(|e| PipelineError::Report(e.to_string()))?;
        info!("Stored report in {}", folder.path);
        Ok(())
    }

    fn record_run(&self, report: &RunReport, started_at: chrono::DateTime<Utc>) {
        let row = RunRow {
            id: report.run_id.clone(),
            started_at: started_at.to_rfc3339(),
            finished_at: Utc::now().to_rfc3339(),
            processed_count: report.outcome.processed_count as u32,
            error_count: report.outcome.error_count as u32,
            success: report.outcome.success,
        };
        if let Err(e) = self.tracker.record_run(&row) {
            warn!("Failed to record run {}: {}", report.run_id, e);
        }
    }
}

/// Loads settings from `store` and runs one batch.
///
/// Settings and backend errors are returned before anything is touched; every
/// later failure is part of the report.
pub async fn run_batch(
    store: &dyn SettingsStore,
    host: Arc<dyn MailHost>,
    tracker: MessageTracker,
) -> Result<RunReport> {
    let settings = store.load()?;
    BatchRunner::from_settings(settings, host, tracker)?.run().await
}
