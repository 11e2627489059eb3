use crate::server::AppConfig;
use ravensh_exec::InterpreterProcess;
use std::path::Path;

pub async fn run(config: &AppConfig) -> anyhow::Result<()> {
    println!("🏥 ravensh Doctor\n");

    let mut all_ok = true;

    all_ok &= check_config(config);
    all_ok &= check_interpreter(config).await;
    all_ok &= check_scratch_dir(config);
    check_activity_log(config);

    println!();
    if all_ok {
        println!("✅ All checks passed! Ready to serve.");
    } else {
        println!("⚠️  Some checks failed. Please fix the issues above.");
        std::process::exit(1);
    }

    Ok(())
}

fn check_config(config: &AppConfig) -> bool {
    print!("Checking configuration... ");
    match config.validate() {
        Ok(()) => {
            println!("✅ Valid");
            println!(
                "  listen {}:{}, idle timeout {}s, program timeout {}ms",
                config.server.host,
                config.server.port,
                config.session.idle_timeout_secs,
                config.execution.timeout_ms
            );
            true
        }
        Err(e) => {
            println!("❌ {:#}", e);
            false
        }
    }
}

async fn check_interpreter(config: &AppConfig) -> bool {
    let command = config.interpreter.command();
    print!("Checking interpreter `{}`... ", command);

    match InterpreterProcess::spawn(&command, &config.session.pipe_settings()) {
        Ok(process) => {
            let pid = process.pid();
            if let Err(e) = process.kill().await {
                println!("⚠️  Started (pid {:?}) but could not be stopped: {}", pid, e);
                return false;
            }
            println!("✅ Starts (pid {:?})", pid);
            true
        }
        Err(e) => {
            println!("❌ {}", e);
            false
        }
    }
}

fn check_scratch_dir(config: &AppConfig) -> bool {
    let Some(ref dir) = config.execution.scratch_dir else {
        return true;
    };
    print!("Checking scratch directory... ");
    if dir.is_dir() {
        println!("✅ {}", dir.display());
        true
    } else {
        println!("❌ {} does not exist", dir.display());
        false
    }
}

fn check_activity_log(config: &AppConfig) {
    print!("Checking activity log... ");
    match config.logging.activity_dir {
        Some(ref dir) if Path::new(dir).is_dir() => println!("✅ {}", dir.display()),
        Some(ref dir) => println!("⚠️  {} will be created on first write", dir.display()),
        None => println!("⚪ Disabled"),
    }
}
