use crate::server::{build_runner, AppConfig};
use anyhow::{bail, Context};
use ravensh_exec::{ExecutionStatus, ProgramRequest};
use std::io::Write;
use std::path::Path;

pub async fn run(
    config: &AppConfig,
    file: &Path,
    args: String,
    stdin: Option<&Path>,
) -> anyhow::Result<()> {
    let src = tokio::fs::read_to_string(file)
        .await
        .with_context(|| format!("Failed to read program file {}", file.display()))?;

    let stdin = match stdin {
        Some(path) => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read stdin file {}", path.display()))?,
        None => String::new(),
    };

    let runner = build_runner(config);
    let result = runner
        .execute(&ProgramRequest { src, args, stdin })
        .await
        .context("Failed to start program")?;

    std::io::stdout().write_all(result.stdout.as_bytes())?;
    std::io::stderr().write_all(result.stderr.as_bytes())?;

    match result.status {
        ExecutionStatus::Ok => Ok(()),
        ExecutionStatus::Timeout => bail!(
            "program timed out after {}ms",
            runner.limits().timeout.as_millis()
        ),
        ExecutionStatus::Overflow => bail!("program output exceeded the configured limit"),
    }
}
