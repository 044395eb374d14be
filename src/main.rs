use std::env;
use std::fs;
use std::process;
use getopts::Options;
use grammar::LexMode;
use imp::report::{report_parse_error, report_spec_error};
use imp::Specification;
use log::LevelFilter;
use simplelog::{Config, SimpleLogger};

fn main() {
  let args = env::args().collect::<Vec<_>>();
  let prog = args.first().cloned().unwrap_or_else(|| "imp".to_owned());
  let mut opts = Options::new();
  opts.optflag("c", "classic", "Lex with longest matches and require a single parse tree");
  opts.optflag("j", "json", "GRAMMAR is a JSON snapshot instead of a grammar description");
  opts.optopt("o", "export", "Write the built grammar as a JSON snapshot", "PATH");
  opts.optopt("s", "start", "Parse from this symbol instead of the grammar's start symbol", "NAME");
  opts.optflag("t", "trees", "Print every parse tree");
  opts.optflag("v", "verbose", "Log what is going on");
  opts.optflag("h", "help", "Print this message");

  let matches = match opts.parse(&args[1..]) {
    Ok(m) => m,
    Err(err) => {
      eprintln!("{}", err);
      process::exit(1);
    }
  };

  if matches.opt_present("h") {
    print_usage(&prog, &opts);
    return;
  }

  let level = if matches.opt_present("v") {
    LevelFilter::Debug
  } else {
    LevelFilter::Warn
  };
  if let Err(err) = SimpleLogger::init(level, Config::default()) {
    eprintln!("{}", err);
  }

  let (grammar_path, input_path) = match matches.free.as_slice() {
    [grammar] => (grammar.clone(), None),
    [grammar, input] => (grammar.clone(), Some(input.clone())),
    _ => {
      print_usage(&prog, &opts);
      process::exit(1);
    }
  };

  let text = read(&grammar_path);
  let spec = if matches.opt_present("j") {
    Specification::from_json(&text)
  } else if matches.opt_present("c") {
    Specification::from_bnf_classic(&text)
  } else {
    Specification::from_bnf(&text)
  };
  let mut spec = match spec {
    Ok(spec) => spec,
    Err(err) => {
      eprint!("{}", report_spec_error(&grammar_path, &text, &err));
      process::exit(1);
    }
  };
  if let Some(start) = matches.opt_str("s") {
    spec = spec.with_start(start);
  }

  if let Some(export) = matches.opt_str("o") {
    let json = match spec.to_json() {
      Ok(json) => json,
      Err(err) => {
        eprintln!("{}", err);
        process::exit(1);
      }
    };
    if let Err(err) = fs::write(&export, json) {
      eprintln!("cannot write {}: {}", export, err);
      process::exit(1);
    }
  }

  let input_path = match input_path {
    Some(path) => path,
    None => {
      println!(
        "{} non-terminals, {} tokens, start symbol `{}`",
        spec.rules().len(),
        spec.lexer().len(),
        spec.start_symbol()
      );
      return;
    }
  };

  let input = read(&input_path);
  let trees = if matches.opt_present("c") {
    spec.parse_classic(&input).map(|tree| vec![tree])
  } else {
    spec.try_parse_with(&input, None, LexMode::Ambiguous)
      .map(|forest| forest.trees())
  };
  let trees = match trees {
    Ok(trees) => trees,
    Err(err) => {
      eprint!("{}", report_parse_error(&input_path, &input, &err, spec.rules()));
      process::exit(1);
    }
  };

  if matches.opt_present("t") {
    for tree in &trees {
      println!("{}", tree);
    }
  } else {
    println!("{} parse tree(s)", trees.len());
  }
}

fn read(path: &str) -> String {
  match fs::read_to_string(path) {
    Ok(text) => text,
    Err(err) => {
      eprintln!("cannot read {}: {}", path, err);
      process::exit(1);
    }
  }
}

fn print_usage(prog: &str, opts: &Options) {
  let brief = format!("Usage: {} [options] GRAMMAR [INPUT]", prog);
  print!("{}", opts.usage(&brief));
}
