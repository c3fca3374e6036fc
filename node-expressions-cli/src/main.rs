use anyhow::Result;
use clap::Parser;
use clap_verbosity_flag::Verbosity;
use log::info;
use node_expressions::interpreter::convert;
use node_expressions::interpreter::number::NumericKind;

/// Parses and evaluates infix expressions separated by ';'
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Arguments {
    /// The expressions to evaluate, e.g. "a = 3; (a + 1) * 2"
    expression: String,

    /// Numeric kind of literals: integer, float or double
    #[clap(short, long, default_value = "integer")]
    kind: NumericKind,

    /// Print each expression as a tree instead of evaluating it
    #[clap(short, long)]
    tree: bool,

    #[clap(flatten)]
    verbose: Verbosity,
}

fn main() -> Result<()> {
    let args = Arguments::parse();
    env_logger::Builder::new()
        .filter_level(args.verbose.log_level_filter())
        .init();

    let parsed = convert(&args.expression, args.kind)?;
    info!("Parsed {} expression(s) as {}", parsed.len(), args.kind);

    let expressions = parsed.expressions();
    for root in parsed.roots() {
        if args.tree {
            print!("{}", expressions.format_tree(*root)?);
            continue;
        }
        let rendered = expressions.display(*root);
        match expressions.value(*root) {
            Ok(value) => println!("{} => {}", rendered, value),
            Err(error) => println!("{} => {}", rendered, error),
        }
    }
    Ok(())
}
