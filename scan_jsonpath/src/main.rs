use clap::Parser;
use scan_jsonpath::{Error, JsonPath, Options};
use std::io::{self, BufWriter, Read, Write};

#[derive(Parser, Debug)]
#[command(name = "scan_jsonpath")]
#[command(about = "Print the nodes of a JSON document selected by a JSONPath expression", long_about = None)]
struct Args {
    /// JSONPath expression, for example `$.store.book[?(@.price < 10)].title`
    expression: String,

    /// Input file (stdin if not specified)
    #[arg(short, long)]
    input: Option<String>,

    /// Only compile the expression, do not read any input
    #[arg(long, default_value_t = false)]
    check: bool,

    /// Print only the values, one per line, without their paths
    #[arg(long, default_value_t = false)]
    values_only: bool,

    /// Deepest container nesting accepted in the input
    #[arg(long)]
    max_depth: Option<usize>,

    /// Initial size of the read buffer, in bytes
    #[arg(long)]
    buffer_size: Option<usize>,
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    let path = match JsonPath::compile(&args.expression) {
        Ok(path) => path,
        Err(e) => fail(&e),
    };
    if args.check {
        println!("ok: {path}");
        return;
    }

    let mut options = Options::default();
    if let Some(max_depth) = args.max_depth {
        options = options.with_max_depth(max_depth);
    }
    if let Some(buffer_size) = args.buffer_size {
        options = options.with_buffer_size(buffer_size);
    }

    let result = if let Some(input_path) = &args.input {
        match std::fs::File::open(input_path) {
            Ok(file) => print_matches(&path, file, &options, args.values_only),
            Err(e) => fail(&Error::Io(e)),
        }
    } else {
        print_matches(&path, io::stdin().lock(), &options, args.values_only)
    };

    if let Err(e) = result {
        fail(&e);
    }
}

fn print_matches<R: Read>(
    path: &JsonPath,
    reader: R,
    options: &Options,
    values_only: bool,
) -> Result<(), Error> {
    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    for found in path.stream_with_options(reader, options) {
        let found = found?;
        let line = if values_only {
            serde_json::to_string(&found.value)
        } else {
            serde_json::to_string(&found)
        };
        // a Value always serializes
        let line = line.map_err(io::Error::from)?;
        writeln!(out, "{line}")?;
    }
    out.flush()?;
    Ok(())
}

fn fail(e: &Error) -> ! {
    eprintln!("Error: {e}");
    eprintln!("  Kind: {:?}", e.kind());
    if let Some(index) = e.index() {
        eprintln!("  Position in input: {index} bytes");
    }
    std::process::exit(1);
}
