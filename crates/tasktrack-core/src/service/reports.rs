use tracing::info;

use crate::{
  Error, Result,
  policy::{self, Action},
  report::{NewReport, ProgressReport, ReportView},
  store::{TaskStore, WriteOutcome},
  user::User,
};

use super::{require_text, unreachable_outcome};

/// Issues and lists progress reports.
pub struct ReportManager<'a, S> {
  store: &'a S,
}

impl<'a, S: TaskStore> ReportManager<'a, S> {
  pub fn new(store: &'a S) -> Self { Self { store } }

  /// Issue a report for `input.internee_id`.
  ///
  /// The internee may be any existing user; the figures are stored as given.
  pub async fn create(
    &self,
    actor: &User,
    input: NewReport,
  ) -> Result<ProgressReport> {
    policy::require(
      actor,
      Action::CreateReport,
      policy::can_create_report(actor.role),
    )?;
    require_text("overall_performance", &input.overall_performance)?;

    match self
      .store
      .create_report(actor.id, input)
      .await
      .map_err(Error::store)?
    {
      WriteOutcome::Applied(report) => {
        info!(
          report_id = report.id,
          internee_id = report.internee_id,
          generated_by = report.generated_by,
          "created progress report"
        );
        Ok(report)
      }
      WriteOutcome::UserMissing(id) => {
        Err(Error::NotFound(format!("user {id}")))
      }
      WriteOutcome::TaskMissing | WriteOutcome::NotAssignee => {
        unreachable_outcome("create_report")
      }
    }
  }

  /// Every report for admins; only their own for internees.
  pub async fn list(&self, actor: &User) -> Result<Vec<ReportView>> {
    let mut reports = self
      .store
      .list_reports(policy::report_scope(actor))
      .await
      .map_err(Error::store)?;
    reports.retain(|r| {
      policy::can_view_report(actor.role, actor.id, r.report.internee_id)
    });
    Ok(reports)
  }
}
