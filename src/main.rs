use std::{env, fs, io, process};

use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use slate_lang::Session;

fn main() {
    let args: Vec<String> = env::args().collect();

    match args.len() {
        n if n > 2 => {
            println!("Usage: slate [script]");
            process::exit(64);
        }
        2 => run_file(&args[1]),
        _ => run_prompt(),
    }
}

fn run_file(path: &str) {
    let source = match fs::read_to_string(path) {
        Ok(source) => source,
        Err(error) => {
            eprintln!("Could not read {path}: {error}");
            process::exit(74);
        }
    };

    let mut session = Session::new(io::stdout());
    session.run(&source);

    // A runtime error wins over a compile error when both flags are set.
    if session.had_runtime_error() {
        process::exit(70);
    }
    if session.had_error() {
        process::exit(65);
    }
}

fn run_prompt() {
    let mut editor = DefaultEditor::new().expect("the line editor initializes");

    let history = home::home_dir().map(|dir| dir.join(".slate_history"));
    if let Some(history) = &history {
        // Missing on first launch.
        let _ = editor.load_history(history);
    }

    let mut session = Session::new(io::stdout());

    loop {
        match editor.readline("> ") {
            Ok(line) => {
                let _ = editor.add_history_entry(line.as_str());

                // Errors never end the prompt; the flags are cleared and the
                // globals carry over to the next line.
                session.run(&line);
                session.reset_errors();
            }
            Err(ReadlineError::Interrupted) => continue,
            Err(ReadlineError::Eof) => break,
            Err(error) => {
                eprintln!("Could not read line: {error}");
                break;
            }
        }
    }

    if let Some(history) = &history {
        let _ = editor.save_history(history);
    }
}
