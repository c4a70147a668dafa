//! Custom actions runnable against selected records

use async_trait::async_trait;
use grappelli_types::{ActionDescriptor, ActionOutcome, AdminResult, Record};

/// A named operation applied to zero or more records
///
/// Standalone actions run without record targets. Errors returned from
/// `run` are caught at the dispatch boundary and surfaced as a danger
/// outcome instead of a failed request.
#[async_trait]
pub trait Action: Send + Sync {
	/// Display name
	fn name(&self) -> &str;

	/// URI-safe key, derived from the name unless overridden
	fn uri_key(&self) -> String {
		self.name()
			.to_lowercase()
			.split_whitespace()
			.collect::<Vec<_>>()
			.join("-")
	}

	/// Whether the action runs without record targets
	fn standalone(&self) -> bool {
		false
	}

	/// Execute against the selected records
	async fn run(&self, records: &[Record]) -> AdminResult<ActionOutcome>;

	/// Transport descriptor
	fn descriptor(&self) -> ActionDescriptor {
		ActionDescriptor {
			name: self.name().to_string(),
			uri_key: self.uri_key(),
			standalone: self.standalone(),
		}
	}
}

/// Run an action, converting any error into a danger outcome.
///
/// This is the catch boundary: a failing action produces a structured
/// response the client can display, never an unhandled server error.
pub async fn dispatch(action: &dyn Action, records: &[Record]) -> ActionOutcome {
	match action.run(records).await {
		Ok(outcome) => outcome,
		Err(err) => {
			tracing::error!(action = action.uri_key(), error = %err, "action failed");
			ActionOutcome::Danger { message: err.public_message() }
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use grappelli_types::AdminError;

	struct Publish;

	#[async_trait]
	impl Action for Publish {
		fn name(&self) -> &str {
			"Publish Selected Posts"
		}

		async fn run(&self, records: &[Record]) -> AdminResult<ActionOutcome> {
			Ok(ActionOutcome::Message { message: format!("published {}", records.len()) })
		}
	}

	struct AlwaysFails;

	#[async_trait]
	impl Action for AlwaysFails {
		fn name(&self) -> &str {
			"Always Fails"
		}

		async fn run(&self, _records: &[Record]) -> AdminResult<ActionOutcome> {
			Err(AdminError::UnsupportedOperation("cannot do that".into()))
		}
	}

	#[test]
	fn uri_key_is_derived_from_the_name() {
		assert_eq!(Publish.uri_key(), "publish-selected-posts");
		let descriptor = Publish.descriptor();
		assert_eq!(descriptor.uri_key, "publish-selected-posts");
		assert!(!descriptor.standalone);
	}

	#[tokio::test]
	async fn dispatch_converts_errors_into_danger_outcomes() {
		let outcome = dispatch(&AlwaysFails, &[]).await;
		assert!(matches!(outcome, ActionOutcome::Danger { .. }));

		let outcome = dispatch(&Publish, &[Record::new()]).await;
		assert_eq!(outcome, ActionOutcome::Message { message: "published 1".into() });
	}
}
