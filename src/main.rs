use std::io::{self, Read, Write};
use std::process::ExitCode;

const MODULE: &str = "nmfc";

fn compile_and_write(source: &[u8]) -> nmfc::Result<()> {
    let score = nmfc::compile(source)?;
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    nmfc::codec::serialize(&score, &mut handle)?;
    handle.flush().ok();
    Ok(())
}

fn main() -> ExitCode {
    env_logger::init();

    let mut source = Vec::new();
    if io::stdin().read_to_end(&mut source).is_err() {
        eprintln!("{}: error reading input!", MODULE);
        return ExitCode::FAILURE;
    }

    match compile_and_write(&source) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            match e.line() {
                Some(line) => eprintln!("{}: [Line {}] {}!", MODULE, line, e),
                None => eprintln!("{}: {}!", MODULE, e),
            }
            ExitCode::FAILURE
        }
    }
}
