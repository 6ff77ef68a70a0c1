use rowtrace::{
    equations::parse_system,
    linalg::{
        cramer::solve_cramer_augmented, determinant::determinant, inverse::invert,
        matrix::Matrix, system::classify_system_with_names,
    },
    printer::{FormatOptions, MatrixPrinter},
};
use tracing_subscriber::{fmt, prelude::*, util::SubscriberInitExt, EnvFilter};

fn print_steps(steps: &rowtrace::linalg::trace::StepTrace, opts: &FormatOptions) {
    for step in steps {
        println!("{}", rowtrace::printer::StepPrinter::new(&step.kind, opts));
        if let Some(m) = &step.snapshot {
            println!("{}\n", MatrixPrinter::new_with_options(m, opts.clone()));
        }
    }
}

fn classify() {
    let variables = ["x", "y", "z"];
    let system = parse_system(
        &["2x + y - z = 8", "-3x - y + 2z = -11", "-2x + y + 2z = -3"],
        &variables,
    )
    .unwrap();

    let report = classify_system_with_names(&system, &variables).unwrap();
    print_steps(&report.reduction.steps, &FormatOptions::unicode());
    println!("> {}\n", report.solution);
}

fn cramer() {
    let m = Matrix::parse(&[vec!["1", "1", "12"], vec!["1", "3", "26"]]).unwrap();
    let s = solve_cramer_augmented(&m).unwrap();
    print_steps(&s.steps, &FormatOptions::ascii());
}

fn inverse() {
    let m = Matrix::parse(&[vec!["5", "2"], vec!["-7", "-3"]]).unwrap();
    println!("> det = {}", determinant(&m).unwrap().value);

    let opts = FormatOptions::unicode().with_row_label("F");
    match invert(&m) {
        Ok(inv) => print_steps(&inv.steps, &opts),
        Err(e) => println!("{}", e),
    }

    println!(
        "> {}",
        MatrixPrinter::new_with_options(&invert(&m).unwrap().inverse, FormatOptions::latex())
    );
}

fn main() {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_env("ROWTRACE_LOG"))
        .init();

    classify();
    cramer();
    inverse();
}
