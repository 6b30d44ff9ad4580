use std::panic::AssertUnwindSafe;

use futures::future::BoxFuture;
use futures::FutureExt;
use tracing::{error, info, warn};

use crate::bus::Connection;
use crate::config::HarnessConfig;
use crate::error::{HarnessError, Result};
use crate::event_loop::EventLoop;
use crate::fixtures::FixtureManager;
use crate::notifications::SignalKind;
use crate::supervisor::{ProcessSupervisor, ServiceHandle};

/// Everything one test owns: the service process, the bus connection to it,
/// the notification loop and the fixtures created so far.
pub struct ServiceContext {
    config: HarnessConfig,
    supervisor: ProcessSupervisor,
    service: ServiceHandle,
    connection: Connection,
    events: EventLoop,
    fixtures: FixtureManager<Connection>,
}

impl ServiceContext {
    /// Starts the service and connects to it.
    ///
    /// If the service never claims its name, it is stopped again before the
    /// error is returned.
    pub async fn start(config: HarnessConfig) -> Result<Self> {
        let supervisor = ProcessSupervisor::new(config.environment.clone());
        let mut service = supervisor.start(&config.executable, &config.args)?;

        let connection = match Connection::connect(config.readiness).await {
            Ok(connection) => connection,
            Err(e) => {
                if let Err(stop_err) = supervisor.stop(&mut service, config.shutdown_grace).await {
                    warn!("Teardown after failed connect also failed: {}", stop_err);
                }
                return Err(e);
            }
        };

        Ok(Self {
            events: EventLoop::new(config.event_timeout),
            fixtures: FixtureManager::new(connection.clone()),
            config,
            supervisor,
            service,
            connection,
        })
    }

    /// Runs `body` against a fresh service and tears it down afterwards,
    /// whether the body returned, failed or panicked.
    ///
    /// A body error takes precedence over a teardown error; a panic is
    /// resumed after teardown.
    pub async fn scoped<T, E, F>(config: HarnessConfig, body: F) -> std::result::Result<T, E>
    where
        E: From<HarnessError>,
        F: for<'a> FnOnce(&'a mut ServiceContext) -> BoxFuture<'a, std::result::Result<T, E>>,
    {
        let mut context = Self::start(config).await?;

        let outcome = AssertUnwindSafe(body(&mut context)).catch_unwind().await;
        let teardown = context.teardown().await;

        match outcome {
            Ok(Ok(value)) => {
                teardown?;
                Ok(value)
            }
            Ok(Err(e)) => {
                if let Err(teardown_err) = teardown {
                    warn!("Teardown failed after test error: {}", teardown_err);
                }
                Err(e)
            }
            Err(panic) => {
                if let Err(teardown_err) = teardown {
                    error!("Teardown failed after panic: {}", teardown_err);
                }
                std::panic::resume_unwind(panic)
            }
        }
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    pub fn connection(&self) -> &Connection {
        &self.connection
    }

    pub fn service(&mut self) -> &mut ServiceHandle {
        &mut self.service
    }

    pub fn events(&self) -> &EventLoop {
        &self.events
    }

    pub fn fixtures(&mut self) -> &mut FixtureManager<Connection> {
        &mut self.fixtures
    }

    /// Registers a subscription with the event loop
    pub async fn subscribe(&mut self, signal: SignalKind) -> Result<()> {
        let stream = self.connection.subscribe(signal).await?;
        self.events.register(stream);
        Ok(())
    }

    /// Stops the service. The connection and subscriptions go with it.
    pub async fn teardown(self) -> Result<()> {
        let Self {
            config,
            supervisor,
            mut service,
            connection,
            events,
            fixtures,
        } = self;

        drop(fixtures);
        drop(events);
        drop(connection);

        info!(
            "Tearing down service {} ({}) after {:?}",
            service.pid(),
            service.executable().display(),
            service.uptime()
        );
        supervisor.stop(&mut service, config.shutdown_grace).await
    }
}
