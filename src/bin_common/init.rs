use std::path::Path;

use color_eyre::{
    config::{HookBuilder, Theme},
    eyre::{self, Context},
};

pub fn init_eyre() -> eyre::Result<()> {
    let theme = if std::io::IsTerminal::is_terminal(&std::io::stderr()) {
        Theme::dark()
    } else {
        Theme::new()
    };

    let (panic_hook, eyre_hook) = HookBuilder::default().theme(theme).into_hooks();
    eyre_hook
        .install()
        .wrap_err("failed to install the eyre hook")?;

    // panics additionally go through the logger, stripped of color so the
    // logfile stays readable
    let (plain_panic_hook, _) = HookBuilder::default().theme(Theme::new()).into_hooks();
    std::panic::set_hook(Box::new(move |info| {
        eprintln!("{}", panic_hook.panic_report(info));
        log::error!(target: "panic", "{}", plain_panic_hook.panic_report(info));
    }));

    Ok(())
}

pub fn init_logger(logfile: Option<&Path>) -> eyre::Result<()> {
    let format = |out: fern::FormatCallback, message: &std::fmt::Arguments, record: &log::Record| {
        out.finish(format_args!(
            "{} {:<5} [{}] {}",
            humantime::format_rfc3339_seconds(std::time::SystemTime::now()),
            record.level(),
            record.target(),
            message
        ))
    };

    let mut dispatch = fern::Dispatch::new().level(log::LevelFilter::Debug).chain(
        fern::Dispatch::new()
            .format(format)
            .chain(std::io::stdout()),
    );

    if let Some(logfile) = logfile {
        dispatch = dispatch.chain(
            fern::Dispatch::new()
                .format(format)
                .chain(fern::log_file(logfile).wrap_err_with(|| {
                    format!("failed to open the log file at: {logfile:?}")
                })?),
        );
    }

    dispatch.apply().wrap_err("failed to set the logger")?;

    Ok(())
}
