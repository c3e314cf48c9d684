//! The main application logic, decoupled from the entry point.

use crate::{
    config::Config,
    coordinator::{ExportCoordinator, Termination, TerminationReason},
    core::{Console, Exporter, MetricsProvider, SampleClock},
    formatting::StdoutConsole,
    internal_metrics::{LoggingRecorder, Metrics},
    records::RecordBuffer,
    report::{HtmlExporter, SystemViewer},
    sampler::{Sampler, SamplerExit},
    task_manager::TaskManager,
};
use anyhow::Result;
use std::future::Future;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, warn};

/// A handle to the running application.
pub struct App {
    task_manager: TaskManager,
    sampler: JoinHandle<SamplerExit>,
    records: RecordBuffer,
    coordinator: ExportCoordinator,
}

impl App {
    /// Creates a new `AppBuilder` to construct an `App`.
    pub fn builder(config: Config) -> AppBuilder {
        AppBuilder::new(config)
    }

    /// The records collected so far.
    pub fn records(&self) -> RecordBuffer {
        self.records.clone()
    }

    /// Runs until the sampler stops on its own or `signal` resolves, then
    /// performs the termination protocol.
    ///
    /// On a signal with no export destination the sampler is abandoned
    /// immediately, even mid-query. With a destination, the sampler is asked
    /// to stop and any in-flight tick completes before the snapshot is taken.
    #[instrument(skip_all)]
    pub async fn run<S>(self, signal: S) -> Result<Termination>
    where
        S: Future<Output = ()>,
    {
        let App {
            task_manager,
            mut sampler,
            records,
            coordinator,
        } = self;

        let reason = tokio::select! {
            biased;
            _ = signal => {
                info!("Termination signal received.");
                TerminationReason::Signal
            }
            exit = &mut sampler => {
                if let Err(e) = exit {
                    error!(error = %e, "Sampler task failed.");
                }
                TerminationReason::ProcessExited
            }
        };

        if reason == TerminationReason::Signal {
            task_manager.signal_shutdown();
            if coordinator.exports_on_signal() {
                match sampler.await {
                    Ok(exit) => debug!(?exit, "Sampler stopped."),
                    Err(e) => error!(error = %e, "Sampler task failed."),
                }
            } else {
                sampler.abort();
            }
        }

        let terminating = coordinator.begin(reason, &records);
        task_manager.shutdown().await;
        let termination = coordinator.finish(terminating).await?;
        Ok(termination)
    }
}

/// Builder for the main application.
///
/// Every collaborator can be overridden, which is how the tests swap in
/// scripted providers and recording exporters.
pub struct AppBuilder {
    config: Config,
    provider_override: Option<Arc<dyn MetricsProvider>>,
    exporter_override: Option<Arc<dyn Exporter>>,
    console_override: Option<Arc<dyn Console>>,
    metrics_override: Option<Metrics>,
    clock_override: Option<SampleClock>,
}

impl AppBuilder {
    /// Creates a new `AppBuilder` with the given configuration.
    pub fn new(config: Config) -> Self {
        Self {
            config,
            provider_override: None,
            exporter_override: None,
            console_override: None,
            metrics_override: None,
            clock_override: None,
        }
    }

    /// Overrides the metrics provider.
    pub fn provider_override(mut self, provider: Arc<dyn MetricsProvider>) -> Self {
        self.provider_override = Some(provider);
        self
    }

    /// Overrides the report exporter.
    pub fn exporter_override(mut self, exporter: Arc<dyn Exporter>) -> Self {
        self.exporter_override = Some(exporter);
        self
    }

    /// Overrides the console that receives status lines.
    pub fn console_override(mut self, console: Arc<dyn Console>) -> Self {
        self.console_override = Some(console);
        self
    }

    /// Overrides the metrics system.
    pub fn metrics_override(mut self, metrics: Metrics) -> Self {
        self.metrics_override = Some(metrics);
        self
    }

    /// Overrides the clock used to timestamp records.
    pub fn clock_override(mut self, clock: SampleClock) -> Self {
        self.clock_override = Some(clock);
        self
    }

    /// Builds all components and starts sampling.
    ///
    /// Must be called from within a tokio runtime.
    #[instrument(skip_all)]
    pub fn build(self) -> Result<App> {
        let config = self.config;
        config.validate()?;
        let pid = config.target_pid()?;
        let task_manager = TaskManager::new();

        info!("-------------------- Configuration --------------------");
        info!("Target PID: {}", pid);
        info!("Tick: {:?}", config.tick);
        info!("Provider: {}", config.provider);
        match config.export_destination() {
            Some(path) => info!("HTML Report: {}", path.display()),
            None => info!("HTML Report: Disabled"),
        }
        info!("Log Metrics: {}", config.metrics.log_metrics);
        info!("-------------------------------------------------------");

        // =========================================================================
        // 1. Initialize Metrics
        // =========================================================================
        let metrics = match self.metrics_override {
            Some(m) => m,
            None => {
                if config.metrics.log_metrics {
                    install_logging_recorder(&config, &task_manager);
                }
                Metrics::new()
            }
        };
        let metrics = Arc::new(metrics);

        // =========================================================================
        // 2. Instantiate Collaborators
        // =========================================================================
        let provider = self
            .provider_override
            .unwrap_or_else(|| config.provider.build());
        let console = self
            .console_override
            .unwrap_or_else(|| Arc::new(StdoutConsole));
        let exporter = self.exporter_override.unwrap_or_else(|| {
            let exporter = HtmlExporter::new(format!("procplot: pid {}", pid));
            let exporter = if config.open_report {
                exporter.with_viewer(Arc::new(SystemViewer))
            } else {
                exporter
            };
            Arc::new(exporter)
        });
        let coordinator = ExportCoordinator::new(
            config.export_destination().map(|path| path.to_path_buf()),
            exporter,
        );

        // =========================================================================
        // 3. Start the Sampler
        // =========================================================================
        let records = RecordBuffer::new();
        let mut sampler = Sampler::new(
            pid,
            config.tick,
            provider,
            records.clone(),
            console,
            metrics,
        );
        if let Some(clock) = self.clock_override {
            sampler = sampler.with_clock(clock);
        }
        let sampler = tokio::spawn(sampler.run(task_manager.shutdown_rx()));

        info!("procplot initialized successfully. Sampling pid {}...", pid);

        Ok(App {
            task_manager,
            sampler,
            records,
            coordinator,
        })
    }
}

fn install_logging_recorder(config: &Config, task_manager: &TaskManager) {
    let recorder = LoggingRecorder::new();
    let reporter = recorder.reporter(
        std::time::Duration::from_secs(config.metrics.log_interval_seconds.max(1)),
        task_manager.shutdown_rx(),
    );
    match metrics::set_global_recorder(recorder) {
        Ok(()) => {
            info!(
                "Logging recorder enabled. Metrics will be logged every {} seconds.",
                config.metrics.log_interval_seconds.max(1)
            );
            task_manager.spawn("MetricsLogger", reporter);
        }
        Err(e) => warn!(error = %e, "Could not install the metrics recorder."),
    }
}

/// Resolves on the first Ctrl-C, or SIGTERM on Unix.
pub async fn termination_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl-C.");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to listen for SIGTERM.");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
