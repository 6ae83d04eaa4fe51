use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// `RUST_LOG` wins over `verbose` when it is set.
pub fn init(verbose: bool) {
    let default = if verbose {
        "wsbind=debug,wsbind_codegen=debug,wsbind_wsdl=info,wsbind_conformance=debug"
    } else {
        "wsbind=info,wsbind_codegen=info,wsbind_conformance=info"
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr)
                .compact(),
        )
        .init();
}
