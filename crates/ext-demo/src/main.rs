//! user-times-demo: evaluate a user-defined Times op next to the built-in one
//!
//! Usage:
//!   user-times-demo [--out-dim N] [--in-dim N] [--batch-size N] [--seed S]
//!
//! Set `RUST_LOG=debug` to see shape inference and output allocation.

use std::collections::{HashMap, HashSet};

use anyhow::{ensure, Context, Result};
use clap::Parser;
use log::info;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use ext_graph::{Axis, Initializer, OutputMap, TimesFunction, UserTimesFunction, Value, Variable};
use ext_tensor::{DType, DeviceDescriptor, Shape};

/// Compare the user-defined Times op against the built-in Times
#[derive(Parser, Debug)]
#[command(name = "user-times-demo")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Rows of the weight matrix
    #[arg(long, default_value_t = 15)]
    out_dim: usize,

    /// Columns of the weight matrix and length of each input sample
    #[arg(long, default_value_t = 10)]
    in_dim: usize,

    /// Number of input samples in the batch
    #[arg(long, default_value_t = 3)]
    batch_size: usize,

    /// Seed for weight initialization and input data
    #[arg(long)]
    seed: Option<u64>,

    /// Largest accepted absolute difference between the two results
    #[arg(long, default_value_t = 1e-5)]
    tolerance: f32,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    ensure!(
        args.out_dim > 0 && args.in_dim > 0 && args.batch_size > 0,
        "dimensions and batch size must be positive"
    );

    let device = DeviceDescriptor::cpu();
    let w = Variable::parameter(
        Shape::new(vec![args.out_dim, args.in_dim]),
        DType::F32,
        &Initializer::GlorotUniform { seed: args.seed },
        device,
        "W",
    )?;
    let x = Variable::input(
        Shape::new(vec![args.in_dim]),
        DType::F32,
        vec![Axis::default_batch_axis()],
        "x",
    );

    let built_in = TimesFunction::create(&w, &x, "BuiltInTimes")?;
    let user_defined = UserTimesFunction::create(&w, &x, "UserDefinedTimes")?;
    info!(
        "{} -> {}, {} -> {}",
        built_in.op_name(),
        built_in.output().shape(),
        user_defined.op_name(),
        user_defined.output().shape()
    );

    let mut rng = match args.seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_entropy(),
    };
    let input_data: Vec<f32> = (0..args.in_dim * args.batch_size)
        .map(|_| rng.gen::<f32>())
        .collect();
    let mut arguments = HashMap::new();
    arguments.insert(x.clone(), Value::create_batch(x.shape(), &input_data, device)?);

    let no_retain = HashSet::new();
    let mut outputs = OutputMap::new();
    outputs.insert(built_in.output().clone(), None);
    outputs.insert(user_defined.output().clone(), None);
    built_in.forward(&arguments, &mut outputs, &device, &no_retain)?;
    user_defined.forward(&arguments, &mut outputs, &device, &no_retain)?;

    let expected = outputs
        .get(built_in.output())
        .and_then(Option::as_ref)
        .context("built-in Times produced no output")?;
    let actual = outputs
        .get(user_defined.output())
        .and_then(Option::as_ref)
        .context("user-defined Times produced no output")?;
    ensure!(
        expected.shape() == actual.shape(),
        "output shapes differ: {} vs {}",
        expected.shape(),
        actual.shape()
    );

    let expected = expected.data().data_f32()?;
    let actual = actual.data().data_f32()?;
    let max_diff = max_abs_diff(expected, actual);
    info!("max |built-in - user-defined| = {:.3e}", max_diff);

    for (j, column) in actual.chunks(args.out_dim).enumerate() {
        let rendered: Vec<String> = column.iter().map(|v| format!("{:.4}", v)).collect();
        println!("sample {}: [{}]", j, rendered.join(", "));
    }

    ensure!(
        max_diff <= args.tolerance,
        "user-defined Times differs from built-in Times by {:.3e} (tolerance {:.1e})",
        max_diff,
        args.tolerance
    );
    println!("user-defined Times matches built-in Times (max diff {:.3e})", max_diff);
    Ok(())
}

/// Largest elementwise `|e - a|`, or NaN if any difference is NaN.
///
/// `f32::max` drops NaN operands, so NaN is carried through explicitly and
/// then fails the `<=` tolerance check.
fn max_abs_diff(expected: &[f32], actual: &[f32]) -> f32 {
    expected
        .iter()
        .zip(actual)
        .map(|(e, a)| (e - a).abs())
        .fold(0.0f32, |acc, d| {
            if acc.is_nan() || d.is_nan() {
                f32::NAN
            } else {
                acc.max(d)
            }
        })
}
