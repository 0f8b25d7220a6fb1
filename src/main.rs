mod cli;
mod commands;
mod env_loader;
mod error;
mod fah;
mod logging;

fn main() {
    env_loader::load_dotenv();

    if let Err(err) = cli::run() {
        match err.downcast_ref::<error::FahdbError>() {
            Some(typed) => eprintln!("error[{}]: {err:#}", typed.code()),
            None => eprintln!("error: {err:#}"),
        }
        std::process::exit(error::exit_code_for(&err));
    }
}
