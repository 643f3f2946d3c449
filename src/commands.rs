//! Command handlers. Each returns `Ok(false)` when the operation ended in a
//! failure that should set a nonzero exit code.

use anyhow::Result;
use std::future::Future;
use std::io::{BufRead, Write};
use std::sync::Arc;

use gamecamp::kernel::matcher;
use gamecamp::models::{driver_folder, find_driver};
use gamecamp::system::root;
use gamecamp::ui::render;
use gamecamp::{
    AppError, AssistantSettings, DashboardController, DriverController, DriverOrchestrator,
    DriverUiState, InstallResult, ResetResult, SystemWrapper, TerminalLog, DRIVER_CATALOG,
};

pub async fn status(orchestrator: &DriverOrchestrator) -> Result<bool> {
    print!("{}", render::format_status(&orchestrator.store().status()));

    let kernel = orchestrator.kernel_version();
    let compat = if orchestrator.is_compatible() {
        "supported"
    } else {
        "unsupported"
    };
    println!("Kernel:          {} ({})", kernel, compat);

    let rooted = root::is_rooted().await;
    println!("Root detected:   {}", if rooted { "yes" } else { "no" });
    Ok(true)
}

pub fn drivers(orchestrator: &DriverOrchestrator) -> Result<bool> {
    for entry in DRIVER_CATALOG {
        let scripts = orchestrator.available_scripts(entry.name);
        print!("{}", render::format_driver(entry, &scripts));
    }
    println!();
    println!("Supported kernels: {}", matcher::supported_families().join(", "));
    Ok(true)
}

pub fn show_match(orchestrator: &DriverOrchestrator, driver: Option<String>) -> Result<bool> {
    let driver = driver.unwrap_or_else(|| orchestrator.store().selected_driver());
    let kernel = orchestrator.kernel_version();
    println!("Kernel version: {}", kernel);
    println!(
        "Family:         {}",
        matcher::family_for(&kernel).unwrap_or("none")
    );

    if find_driver(&driver).is_none() {
        render::display_error(&format!("Unknown driver '{}'", driver));
        return Ok(false);
    }
    let Some(folder) = driver_folder(&driver) else {
        render::display_error(&format!("Driver '{}' is not available yet", driver));
        return Ok(false);
    };

    match orchestrator.recommended_script(&driver) {
        Some(script) => {
            println!("Script:         drivers/{}/{}", folder, script);
            Ok(true)
        }
        None => {
            render::display_error(&format!(
                "No driver file found for kernel {} in '{}'",
                kernel, folder
            ));
            Ok(false)
        }
    }
}

/// Drive `op` while printing terminal log entries as they are appended.
async fn stream_terminal<F: Future>(terminal: &TerminalLog, op: F) -> F::Output {
    let mut rx = terminal.subscribe();
    let mut printed = 0usize;
    let mut print_new = |entries: &[gamecamp::TerminalLogEntry]| {
        if entries.len() < printed {
            // log was cleared for a new operation
            printed = 0;
        }
        for entry in &entries[printed..] {
            render::display_entry(entry);
        }
        printed = entries.len();
    };

    tokio::pin!(op);
    let output = loop {
        tokio::select! {
            output = &mut op => break output,
            Ok(()) = rx.changed() => {
                let entries = rx.borrow_and_update().clone();
                print_new(&entries);
            }
        }
    };
    print_new(&terminal.entries());
    output
}

fn report_elapsed(orchestrator: &DriverOrchestrator) {
    if let Some(elapsed) = orchestrator.last_elapsed() {
        println!("Finished in {:.1}s", elapsed.as_secs_f64());
    }
}

pub async fn install(orchestrator: DriverOrchestrator, driver: Option<String>) -> Result<bool> {
    let controller = DriverController::new(orchestrator);
    if let Some(name) = driver {
        if find_driver(&name).is_none() {
            render::display_error(&format!("Unknown driver '{}'", name));
            return Ok(false);
        }
        if !controller.select_driver(&name) {
            render::display_error(&format!(
                "Driver '{}' is already installed, reset it first",
                controller.get_state().selected_driver()
            ));
            return Ok(false);
        }
    } else if controller.get_state().is_driver_installed() {
        render::display_error(&format!(
            "Driver '{}' is already installed, reset it first",
            controller.get_state().selected_driver()
        ));
        return Ok(false);
    }

    let terminal = controller.orchestrator().terminal().clone();
    let result = stream_terminal(&terminal, controller.install()).await;
    report_elapsed(controller.orchestrator());
    controller.dismiss_terminal();

    match result {
        InstallResult::Success => {
            render::display_success("Driver installed");
            Ok(true)
        }
        InstallResult::Error(message) => {
            render::display_error(&message);
            Ok(false)
        }
    }
}

fn confirm(prompt: &str) -> std::result::Result<bool, AppError> {
    print!("{} [y/N] ", prompt);
    std::io::stdout().flush()?;
    let mut answer = String::new();
    std::io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}

pub async fn reset(orchestrator: DriverOrchestrator, yes: bool) -> Result<bool> {
    let controller = DriverController::new(orchestrator);
    controller.request_reset().await;

    match controller.get_state() {
        DriverUiState::ShowConfirmDialog { driver } => {
            let prompt = format!("Reset driver '{}' and reboot the device?", driver);
            let confirmed = if yes {
                true
            } else {
                match confirm(&prompt) {
                    Ok(answer) => answer,
                    Err(e) => {
                        controller.dismiss_confirm();
                        render::display_error(&e.user_message());
                        return Ok(false);
                    }
                }
            };
            if !confirmed {
                controller.dismiss_confirm();
                println!("Reset cancelled");
                return Ok(true);
            }
        }
        DriverUiState::ResetFailure { message, .. } => {
            render::display_error(&message);
            return Ok(false);
        }
        _ => {
            render::display_error("No driver is installed");
            return Ok(false);
        }
    }

    let terminal = controller.orchestrator().terminal().clone();
    let result = stream_terminal(&terminal, controller.confirm_reset()).await;
    report_elapsed(controller.orchestrator());
    let state = controller.get_state();
    controller.dismiss_terminal();

    match result {
        ResetResult::Success => {
            render::display_success("Driver reset, the device will reboot shortly");
            Ok(true)
        }
        _ => {
            let message = state
                .error_message()
                .map(str::to_string)
                .unwrap_or_else(|| format!("{:?}", result));
            render::display_error(&message);
            Ok(false)
        }
    }
}

pub async fn info(system: Arc<dyn SystemWrapper>) -> Result<bool> {
    let dashboard = DashboardController::new(system);
    dashboard.refresh().await;
    let state = dashboard.get_state();
    for section in &state.sections {
        println!("{}", render::format_section(section));
    }
    if let Some(error) = state.error {
        render::display_error(&error);
        return Ok(false);
    }
    Ok(true)
}

pub fn assistant(
    orchestrator: &DriverOrchestrator,
    anti_screen_recording: Option<bool>,
    no_background_mode: Option<bool>,
    single_transparent_mode: Option<bool>,
) -> Result<bool> {
    let store = orchestrator.store();
    let current = store.assistant_settings();
    let next = AssistantSettings {
        anti_screen_recording: anti_screen_recording.unwrap_or(current.anti_screen_recording),
        no_background_mode: no_background_mode.unwrap_or(current.no_background_mode),
        single_transparent_mode: single_transparent_mode.unwrap_or(current.single_transparent_mode),
    };
    if next != current {
        if let Err(e) = store.save_assistant_settings(next) {
            render::display_error(&AppError::from(e).user_message());
            return Ok(false);
        }
    }

    println!("anti_screen_recording:   {}", next.anti_screen_recording);
    println!("no_background_mode:      {}", next.no_background_mode);
    println!("single_transparent_mode: {}", next.single_transparent_mode);
    Ok(true)
}
