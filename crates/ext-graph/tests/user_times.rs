use std::collections::{HashMap, HashSet};

use approx::assert_relative_eq;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use ext_graph::{
    Axis, GraphError, Initializer, OutputMap, TimesFunction, UserTimesFunction, Value, Variable,
};
use ext_tensor::{CpuStorage, DType, DeviceDescriptor, Shape, Tensor, TensorError};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn glorot_weight(out_dim: usize, in_dim: usize, seed: u64) -> Variable {
    Variable::parameter(
        Shape::new(vec![out_dim, in_dim]),
        DType::F32,
        &Initializer::GlorotUniform { seed: Some(seed) },
        DeviceDescriptor::cpu(),
        "W",
    )
    .unwrap()
}

fn batch_input(in_dim: usize) -> Variable {
    Variable::input(
        Shape::new(vec![in_dim]),
        DType::F32,
        vec![Axis::default_batch_axis()],
        "x",
    )
}

fn random_batch(rng: &mut StdRng, len: usize) -> Vec<f32> {
    (0..len).map(|_| rng.gen::<f32>()).collect()
}

/// `W x_j` for every sample `j`, computed row by row.
fn reference(w: &[f32], rows: usize, cols: usize, x: &[f32]) -> Vec<f32> {
    x.chunks(cols)
        .flat_map(|sample| {
            (0..rows).map(move |i| (0..cols).map(|p| w[p * rows + i] * sample[p]).sum::<f32>())
        })
        .collect()
}

fn weight_data(w: &Variable) -> Vec<f32> {
    w.value().unwrap().data().data_f32().unwrap().to_vec()
}

#[test]
fn test_batch_of_three_matches_reference_and_builtin() {
    init_logging();
    let device = DeviceDescriptor::cpu();
    let (out_dim, in_dim, batch) = (15, 10, 3);
    let w = glorot_weight(out_dim, in_dim, 11);
    let x = batch_input(in_dim);

    let builtin = TimesFunction::create(&w, &x, "BuiltInTimes").unwrap();
    let user = UserTimesFunction::create(&w, &x, "UserDefinedTimes").unwrap();

    let mut rng = StdRng::seed_from_u64(3);
    let data = random_batch(&mut rng, in_dim * batch);
    let mut args = HashMap::new();
    args.insert(x.clone(), Value::create_batch(x.shape(), &data, device).unwrap());

    let mut outputs = OutputMap::new();
    outputs.insert(user.output().clone(), None);
    let state = user
        .forward(&args, &mut outputs, &device, &HashSet::new())
        .unwrap();
    assert!(state.is_none());

    let y = outputs[user.output()].as_ref().unwrap();
    assert_eq!(y.shape().dims(), &[out_dim, batch]);

    let expected = reference(&weight_data(&w), out_dim, in_dim, &data);
    let got = y.data().data_f32().unwrap();
    for (g, e) in got.iter().zip(expected.iter()) {
        assert_relative_eq!(*g, *e, epsilon = 1e-5);
    }

    let y_builtin = builtin.evaluate(&args, &device).unwrap();
    assert_eq!(y_builtin.shape(), y.shape());
    for (g, e) in got.iter().zip(y_builtin.data().data_f32().unwrap()) {
        assert_relative_eq!(*g, *e, epsilon = 1e-5);
    }
}

#[test]
fn test_random_shapes_match_reference() {
    init_logging();
    let device = DeviceDescriptor::cpu();
    let mut rng = StdRng::seed_from_u64(2024);
    for _ in 0..20 {
        let m = rng.gen_range(1..8);
        let k = rng.gen_range(1..8);
        let n = rng.gen_range(1..6);
        let w = glorot_weight(m, k, rng.gen());
        let x = batch_input(k);
        let user = UserTimesFunction::create(&w, &x, "t").unwrap();
        assert_eq!(user.output().shape().dims(), &[m]);

        let data = random_batch(&mut rng, k * n);
        let mut args = HashMap::new();
        args.insert(x.clone(), Value::create_batch(x.shape(), &data, device).unwrap());
        let y = user.evaluate(&args, &device).unwrap();

        assert_eq!(y.shape().dims(), &[m, n]);
        let expected = reference(&weight_data(&w), m, k, &data);
        for (g, e) in y.data().data_f32().unwrap().iter().zip(expected.iter()) {
            assert_relative_eq!(*g, *e, epsilon = 1e-5);
        }
    }
}

#[test]
fn test_changing_batch_size_reallocates_output() {
    init_logging();
    let device = DeviceDescriptor::cpu();
    let w = glorot_weight(4, 3, 5);
    let x = batch_input(3);
    let user = UserTimesFunction::create(&w, &x, "t").unwrap();
    let mut outputs = OutputMap::new();

    for batch in [2usize, 5, 1] {
        let data: Vec<f32> = (0..3 * batch).map(|v| v as f32).collect();
        let mut args = HashMap::new();
        args.insert(x.clone(), Value::create_batch(x.shape(), &data, device).unwrap());
        user.forward(&args, &mut outputs, &device, &HashSet::new())
            .unwrap();

        let y = outputs[user.output()].as_ref().unwrap();
        assert_eq!(y.shape().dims(), &[4, batch]);
        let expected = reference(&weight_data(&w), 4, 3, &data);
        for (g, e) in y.data().data_f32().unwrap().iter().zip(expected.iter()) {
            assert_relative_eq!(*g, *e, epsilon = 1e-5);
        }
    }
}

#[test]
fn test_reused_slot_is_zeroed_before_accumulation() {
    init_logging();
    let device = DeviceDescriptor::cpu();
    let w = Variable::parameter(
        Shape::new(vec![2, 2]),
        DType::F32,
        &Initializer::Constant(1.0),
        device,
        "W",
    )
    .unwrap();
    let x = batch_input(2);
    let user = UserTimesFunction::create(&w, &x, "t").unwrap();

    let mut args = HashMap::new();
    args.insert(x.clone(), Value::create_batch(x.shape(), &[1.0, 2.0], device).unwrap());

    let garbage = Tensor::new(vec![99.0, -7.0], Shape::new(vec![2, 1]));
    let mut outputs = OutputMap::new();
    outputs.insert(user.output().clone(), Some(Value::new(garbage)));

    for _ in 0..2 {
        user.forward(&args, &mut outputs, &device, &HashSet::new())
            .unwrap();
        let y = outputs[user.output()].as_ref().unwrap();
        assert_eq!(y.data().data_f32().unwrap(), &[3.0, 3.0]);
    }
}

#[test]
fn test_contraction_mismatch_is_reported_at_evaluation() {
    init_logging();
    let device = DeviceDescriptor::cpu();
    let w = glorot_weight(15, 10, 1);
    let x = batch_input(9);
    // Shape inference only checks ranks and axes.
    let user = UserTimesFunction::create(&w, &x, "t").unwrap();

    let mut args = HashMap::new();
    args.insert(x.clone(), Value::create_batch(x.shape(), &[0.5; 27], device).unwrap());
    let err = user.evaluate(&args, &device).unwrap_err();
    assert!(matches!(
        err,
        GraphError::Tensor(TensorError::ContractionMismatch {
            m: 15,
            k: 10,
            k2: 9,
            n: 3
        })
    ));
}

#[test]
fn test_unbound_and_misshapen_arguments() {
    init_logging();
    let device = DeviceDescriptor::cpu();
    let w = glorot_weight(3, 2, 1);
    let x = batch_input(2);
    let user = UserTimesFunction::create(&w, &x, "t").unwrap();
    assert_eq!(user.arguments(), vec![x.clone()]);
    assert_eq!(user.parameters(), vec![w.clone()]);

    let err = user.evaluate(&HashMap::new(), &device).unwrap_err();
    assert!(matches!(err, GraphError::MissingArgument(ref uid) if *uid == x.uid()));

    let mut args = HashMap::new();
    let unbatched = Tensor::new(vec![1.0, 2.0], Shape::new(vec![2]));
    args.insert(x.clone(), Value::new(unbatched));
    let err = user.evaluate(&args, &device).unwrap_err();
    assert!(matches!(err, GraphError::ValueShapeMismatch { .. }));
}

#[test]
fn test_invalid_operands_fail_before_evaluation() {
    init_logging();
    let x = batch_input(10);
    let rank_one_weight = Variable::parameter(
        Shape::new(vec![10]),
        DType::F32,
        &Initializer::Constant(0.0),
        DeviceDescriptor::cpu(),
        "w",
    )
    .unwrap();
    let matrix_input = Variable::input(Shape::new(vec![10, 1]), DType::F32, vec![], "X");
    let batched_weight = Variable::input(
        Shape::new(vec![15, 10]),
        DType::F32,
        vec![Axis::default_batch_axis()],
        "Wb",
    );

    for (left, right) in [
        (&rank_one_weight, &x),
        (&glorot_weight(15, 10, 0), &matrix_input),
        (&batched_weight, &x),
    ] {
        assert!(matches!(
            UserTimesFunction::create(left, right, "t"),
            Err(GraphError::InvalidOperand { .. })
        ));
    }
}

#[test]
fn test_output_without_dynamic_axes() {
    init_logging();
    let device = DeviceDescriptor::cpu();
    let w = glorot_weight(3, 2, 9);
    let v = Variable::input(Shape::new(vec![2]), DType::F32, vec![], "v");
    let user = UserTimesFunction::create(&w, &v, "t").unwrap();
    assert!(user.output().dynamic_axes().is_empty());

    let mut args = HashMap::new();
    args.insert(v.clone(), Value::new(Tensor::new(vec![1.0, -1.0], Shape::new(vec![2]))));
    let y = user.evaluate(&args, &device).unwrap();
    assert_eq!(y.shape().dims(), &[3]);
}

#[test]
fn test_f64_operands_are_reported_as_unsupported() {
    init_logging();
    let device = DeviceDescriptor::cpu();
    let w = Variable::parameter(
        Shape::new(vec![3, 2]),
        DType::F64,
        &Initializer::Constant(0.5),
        device,
        "W",
    )
    .unwrap();
    let x = Variable::input(
        Shape::new(vec![2]),
        DType::F64,
        vec![Axis::default_batch_axis()],
        "x",
    );
    let user = UserTimesFunction::create(&w, &x, "t").unwrap();
    assert_eq!(user.output().dtype(), DType::F64);

    let batch = Tensor::from_storage(
        CpuStorage::from_f64_vec(vec![1.0, 2.0, 3.0, 4.0]),
        Shape::new(vec![2, 2]),
        device,
    )
    .unwrap();
    let mut args = HashMap::new();
    args.insert(x.clone(), Value::new(batch));

    let err = user.evaluate(&args, &device).unwrap_err();
    assert!(matches!(
        err,
        GraphError::Tensor(TensorError::UnsupportedDType(_))
    ));
}

#[test]
fn test_failed_forward_keeps_previous_output() {
    init_logging();
    let device = DeviceDescriptor::cpu();
    let w = glorot_weight(15, 10, 4);
    let x = batch_input(9);
    let user = UserTimesFunction::create(&w, &x, "t").unwrap();

    let mut args = HashMap::new();
    args.insert(x.clone(), Value::create_batch(x.shape(), &[0.5; 27], device).unwrap());

    // One previous value that would be reused, one that would be replaced.
    let reusable = Value::new(Tensor::new(vec![7.0; 45], Shape::new(vec![15, 3])));
    let misshapen = Value::new(Tensor::new(vec![-1.0; 4], Shape::new(vec![2, 2])));
    for previous in [reusable, misshapen] {
        let mut outputs = OutputMap::new();
        outputs.insert(user.output().clone(), Some(previous.clone()));
        let err = user
            .forward(&args, &mut outputs, &device, &HashSet::new())
            .unwrap_err();
        assert!(matches!(
            err,
            GraphError::Tensor(TensorError::ContractionMismatch { .. })
        ));
        assert_eq!(outputs[user.output()].as_ref(), Some(&previous));
    }
}
