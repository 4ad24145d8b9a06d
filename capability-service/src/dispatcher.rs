//! Capability dispatcher.
//!
//! Resolves the target connection's dialect, asks the builder for a plan,
//! runs its statements one by one through the [`Executor`] and folds the
//! outcomes into a [`Report`]. The dialect is resolved before anything runs,
//! so an unknown connection or an unsupported (capability, dialect) pair
//! never reaches the executor.

use std::sync::Arc;

use common::errors::{AppError, AppResult};
use common::models::database::DatabaseItem;
use common::utils::StatementKind;
use tokio_util::sync::CancellationToken;

use crate::aggregator::{self, Report};
use crate::builder::{self, FailurePolicy, Plan, SqlStatement};
use crate::capability::{Capability, CapabilityRequest};
use crate::dialect::Dialect;
use crate::executor::Executor;

/// Routes capability calls to SQL and back to text.
#[derive(Clone)]
pub struct CapabilityDispatcher {
    executor: Arc<dyn Executor>,
}

impl CapabilityDispatcher {
    pub fn new(executor: Arc<dyn Executor>) -> Self {
        Self { executor }
    }

    /// Looks up `name`, validates `params` and dispatches.
    pub async fn invoke(
        &self,
        name: &str,
        params: serde_json::Value,
        cancel: &CancellationToken,
    ) -> AppResult<String> {
        let capability = Capability::from_name(name)?;
        let request = CapabilityRequest::parse(capability, params)?;
        self.dispatch(&request, cancel).await
    }

    /// Runs a validated request to completion.
    pub async fn dispatch(
        &self,
        request: &CapabilityRequest,
        cancel: &CancellationToken,
    ) -> AppResult<String> {
        let capability = request.capability();
        let Some(id) = request.connection_id() else {
            tracing::info!(capability = %capability, "listing databases");
            return Ok(self.list_databases().await);
        };

        tracing::info!(capability = %capability, database = %id, "dispatching capability");

        let dialect = self.resolve_dialect(id, capability).await?;
        let plan = builder::build(dialect, request)?;

        let (statements, policy) = match plan {
            Plan::Notice(text) => return Ok(text),
            Plan::Statements { statements, policy } => (statements, policy),
        };

        let mut report = Report::new(aggregator::heading(request, dialect));
        for (index, statement) in statements.iter().enumerate() {
            if cancel.is_cancelled() {
                tracing::info!(
                    capability = %capability,
                    database = %id,
                    completed = index,
                    remaining = statements.len() - index,
                    "capability cancelled"
                );
                return Err(AppError::Cancelled);
            }

            match self.execute(cancel, id, statement).await {
                Ok(text) => report.push_output(text),
                Err(AppError::Cancelled) => return Err(AppError::Cancelled),
                Err(err) if policy == FailurePolicy::Inline => {
                    tracing::warn!(
                        capability = %capability,
                        database = %id,
                        statement = index,
                        error = %err,
                        "statement failed, continuing"
                    );
                    report.push_failure(&statement.sql, &err);
                }
                Err(err) => return Err(err),
            }
        }

        if !report.is_empty() && report.failures() == report.len() {
            tracing::warn!(
                capability = %capability,
                database = %id,
                statements = report.len(),
                "every statement failed"
            );
        }

        Ok(report.render())
    }

    async fn resolve_dialect(&self, id: &str, capability: Capability) -> AppResult<Dialect> {
        let db_type = self.executor.database_type(id).await?;
        db_type
            .parse::<Dialect>()
            .map_err(|_| AppError::unsupported(db_type, capability.name()))
    }

    async fn execute(
        &self,
        cancel: &CancellationToken,
        id: &str,
        statement: &SqlStatement,
    ) -> AppResult<String> {
        match statement.kind {
            StatementKind::Query => {
                self.executor
                    .execute_query(cancel, id, &statement.sql, &statement.params)
                    .await
            }
            StatementKind::Statement => {
                self.executor
                    .execute_statement(cancel, id, &statement.sql, &statement.params)
                    .await
            }
        }
    }

    async fn list_databases(&self) -> String {
        let ids = self.executor.list_databases().await;
        let mut items = Vec::with_capacity(ids.len());

        for id in &ids {
            let item = match self.executor.database_info(id).await {
                Ok(info) => {
                    let db_type = self.executor.database_type(id).await.ok();
                    DatabaseItem::from_info(id, db_type.as_deref(), &info)
                }
                Err(err) => {
                    tracing::debug!(database = %id, error = %err, "no info for database");
                    DatabaseItem::unknown(id)
                }
            };
            items.push(item);
        }

        aggregator::database_table(&items)
    }
}
