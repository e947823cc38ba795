//! User-facing console messages.
//! Labels are colored only when the target stream is a TTY; logs go through `tracing`.

use owo_colors::OwoColorize;

#[derive(Clone, Copy)]
enum Stream {
    Stdout,
    Stderr,
}

impl Stream {
    fn is_tty(self) -> bool {
        match self {
            Stream::Stdout => atty::is(atty::Stream::Stdout),
            Stream::Stderr => atty::is(atty::Stream::Stderr),
        }
    }
}

fn emit(stream: Stream, label: &str, paint: fn(&str) -> String, msg: &str) {
    let label = if stream.is_tty() {
        paint(label)
    } else {
        label.to_string()
    };
    match stream {
        Stream::Stdout => println!("{label} {msg}"),
        Stream::Stderr => eprintln!("{label} {msg}"),
    }
}

pub fn print_info(msg: &str) {
    emit(Stream::Stdout, "info:", |l| l.cyan().bold().to_string(), msg);
}

pub fn print_warn(msg: &str) {
    emit(Stream::Stderr, "warn:", |l| l.yellow().bold().to_string(), msg);
}

pub fn print_error(msg: &str) {
    emit(Stream::Stderr, "error:", |l| l.red().bold().to_string(), msg);
}

pub fn print_success(msg: &str) {
    emit(Stream::Stdout, "ok:", |l| l.green().bold().to_string(), msg);
}

/// Unprefixed line on stdout, for output scripts consume (e.g. `--check`).
pub fn print_user(msg: &str) {
    println!("{msg}");
}
