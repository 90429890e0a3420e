use std::process::ExitCode;

fn main() -> ExitCode {
    let matches = iamgraph_cli::command().get_matches();

    let config = match iamgraph_cli::load_config(&matches) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("error: {err:#}");
            return ExitCode::FAILURE;
        }
    };
    iamgraph_cli::init_tracing(config.log_format);

    let mut stdout = std::io::stdout().lock();
    match iamgraph_cli::run(&matches, config, &mut stdout) {
        Ok(status) => ExitCode::from(status),
        Err(err) => {
            tracing::error!("{err:#}");
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
