//! Readiness detection for LocalStack.
//!
//! LocalStack prints `Ready.` on its own line once every enabled service is
//! up. The check re-reads the whole stdout on every poll, so it keeps no
//! state and may be called any number of times.

use async_trait::async_trait;
use localstack_common::constants::READINESS_MARKER;
use localstack_common::error::Result;
use localstack_common::types::ContainerId;
use localstack_runtime::backend::ContainerRuntime;
use localstack_runtime::wait::WaitUntil;

/// Returns whether accumulated stdout contains the readiness marker,
/// including its trailing newline.
#[must_use]
pub fn is_ready(stdout: &str) -> bool {
    stdout.contains(READINESS_MARKER)
}

/// Wait condition that holds once LocalStack reports readiness.
#[derive(Debug, Clone, Copy, Default)]
pub struct UntilReady;

#[async_trait]
impl WaitUntil for UntilReady {
    async fn until(&self, runtime: &dyn ContainerRuntime, id: &ContainerId) -> Result<bool> {
        let logs = runtime.logs(id).await?;
        let ready = is_ready(&logs.stdout);
        tracing::trace!(id = %id, bytes = logs.stdout.len(), ready, "checked localstack output");
        Ok(ready)
    }
}

#[cfg(test)]
mod tests {
    use localstack_runtime::backend::memory::MemoryRuntime;
    use localstack_runtime::resource::ResourceConfig;

    use super::*;

    #[test]
    fn marker_must_be_present() {
        assert!(!is_ready(""));
        assert!(!is_ready("Starting...\n"));
        assert!(is_ready("Starting...\nReady.\n"));
    }

    #[test]
    fn marker_requires_trailing_newline() {
        assert!(!is_ready("Ready."));
        assert!(!is_ready("Starting...\nReady."));
    }

    #[test]
    fn marker_may_appear_mid_stream() {
        assert!(is_ready("Ready.\n2024-01-01 INFO request served\n"));
    }

    #[test]
    fn check_is_pure() {
        let text = "Starting...\nReady.\n";
        assert!((0..5).all(|_| is_ready(text)));
        assert!((0..5).all(|_| !is_ready("Ready.")));
    }

    #[tokio::test]
    async fn condition_reads_full_stdout_each_poll() {
        let runtime = MemoryRuntime::new().with_log_script(["Starting...\n", "Rea", "dy.\n"]);
        let id = runtime
            .create(&ResourceConfig::new().with_image("localstack"))
            .await
            .expect("create");
        runtime.start(&id).await.expect("start");

        assert!(!UntilReady.until(&runtime, &id).await.expect("poll 1"));
        assert!(!UntilReady.until(&runtime, &id).await.expect("poll 2"));
        assert!(UntilReady.until(&runtime, &id).await.expect("poll 3"));
        assert!(UntilReady.until(&runtime, &id).await.expect("poll 4"));
    }

    #[tokio::test]
    async fn condition_is_false_before_any_output() {
        let runtime = MemoryRuntime::new();
        let id = runtime
            .create(&ResourceConfig::new().with_image("localstack"))
            .await
            .expect("create");
        assert!(!UntilReady.until(&runtime, &id).await.expect("poll"));
    }
}
