use std::{io, num::NonZeroUsize};

use classifier_trainer::{
    evaluate, evaluate_errors,
    metrics::ErrorReport,
    report::{ConsoleReporter, EpochReport, Palette, Reporter},
    run, run_with, train_epoch, RunOptions, TrainErr,
};
use machine_learning::{
    arch::{activations::ActFn, layers::Layer, loss::CrossEntropy, Mode, Model, Sequential},
    dataset::{Blobs, DataLoader, Dataset},
    optimization::GradientDescent,
    Device, Result,
};
use ndarray::{Array2, ArrayView2};
use rand::{rngs::StdRng, SeedableRng};

/// Scores every example with `score(label)`, reading the label from the first input column.
struct Oracle<F> {
    num_classes: usize,
    score: F,
    params: Vec<f32>,
    grad: Vec<f32>,
    mode: Mode,
    grad_enabled: bool,
    device: Device,
}

impl<F: Fn(usize, usize) -> f32> Oracle<F> {
    fn new(num_classes: usize, score: F) -> Self {
        Self {
            num_classes,
            score,
            params: vec![],
            grad: vec![],
            mode: Mode::Train,
            grad_enabled: true,
            device: Device::Cpu,
        }
    }
}

impl<F: Fn(usize, usize) -> f32> Model for Oracle<F> {
    fn size(&self) -> usize {
        0
    }

    fn mode(&self) -> Mode {
        self.mode
    }

    fn set_mode(&mut self, mode: Mode) {
        self.mode = mode;
    }

    fn grad_enabled(&self) -> bool {
        self.grad_enabled
    }

    fn set_grad_enabled(&mut self, enabled: bool) {
        self.grad_enabled = enabled;
    }

    fn device(&self) -> Device {
        self.device
    }

    fn to_device(&mut self, device: Device) {
        self.device = device;
    }

    fn forward(&mut self, x: ArrayView2<f32>) -> Result<Array2<f32>> {
        Ok(Array2::from_shape_fn(
            (x.nrows(), self.num_classes),
            |(i, c)| (self.score)(x[[i, 0]] as usize, c),
        ))
    }

    fn backward(&mut self, _d: Array2<f32>) -> Result<()> {
        Ok(())
    }

    fn zero_grad(&mut self) {}

    fn params_and_grad(&mut self) -> (&mut [f32], &[f32]) {
        (&mut self.params, &self.grad)
    }
}

/// A dataset whose single feature is the label itself.
fn labelled(labels: &[usize], num_classes: usize) -> Dataset {
    let x = Array2::from_shape_fn((labels.len(), 1), |(i, _)| labels[i] as f32);
    Dataset::new(x, labels.to_vec(), num_classes).unwrap()
}

fn loader(dataset: Dataset, batch_size: usize) -> DataLoader {
    DataLoader::new(dataset, NonZeroUsize::new(batch_size).unwrap())
}

fn printed(reporter: ConsoleReporter<Vec<u8>>) -> String {
    String::from_utf8(reporter.into_inner()).unwrap()
}

#[derive(Default)]
struct Recorder {
    epochs: Vec<EpochReport>,
    finished: Vec<ErrorReport>,
}

impl Reporter for Recorder {
    fn epoch(&mut self, report: &EpochReport) -> io::Result<()> {
        self.epochs.push(*report);
        Ok(())
    }

    fn finished(&mut self, errors: &ErrorReport) -> io::Result<()> {
        self.finished.push(*errors);
        Ok(())
    }
}

#[test]
fn always_predicting_class_zero() {
    let mut model = Oracle::new(2, |_, c| if c == 0 { 1. } else { 0. });
    let mut data = loader(labelled(&[0, 1, 0, 1], 2), 3);

    let m = evaluate(&mut model, data.iter()).unwrap();

    assert!((m.accuracy - 0.5).abs() < 1e-6);
    assert!((m.precision - 0.25).abs() < 1e-6);
    assert!((m.recall - 0.5).abs() < 1e-6);
    assert!((m.f1 - 1. / 3.).abs() < 1e-4);

    let errors = evaluate_errors(&mut model, data.iter()).unwrap();

    assert_eq!(errors.top1_error, 0.5);
    assert_eq!(errors.top5_error, 0.);
}

#[test]
fn error_rates_are_exact_fractions() {
    // labels 3 and 4 rank second behind class 5: 0.4 top-1 error
    let mut model = Oracle::new(6, |label, c| match (label, c) {
        (3 | 4, 5) => 1.,
        (3 | 4, c) if c == label => 0.5,
        (label, c) if c == label => 1.,
        _ => 0.,
    });
    let mut data = loader(labelled(&[0, 1, 2, 3, 4], 6), 2);

    let errors = evaluate_errors(&mut model, data.iter()).unwrap();

    assert_eq!(errors.top1_error, 0.4);
    assert_eq!(errors.top5_error, 0.);
}

#[test]
fn perfect_predictions_have_no_error() {
    let mut model = Oracle::new(4, |label, c| if c == label { 1. } else { 0. });
    let mut data = loader(labelled(&[3, 1, 0, 2, 2], 4), 2);

    let m = evaluate(&mut model, data.iter()).unwrap();
    let errors = evaluate_errors(&mut model, data.iter()).unwrap();

    assert_eq!((m.accuracy, m.precision, m.recall, m.f1), (1., 1., 1., 1.));
    assert_eq!(errors.top1_error, 0.);
    assert_eq!(errors.top5_error, 0.);
}

#[test]
fn true_class_ranked_second() {
    let mut model = Oracle::new(5, |label, c| match c {
        c if c == (label + 1) % 5 => 5.,
        c if c == label => 4.,
        _ => 0.,
    });
    let mut data = loader(labelled(&[0, 1, 2, 3, 4, 4], 5), 4);

    let errors = evaluate_errors(&mut model, data.iter()).unwrap();

    assert_eq!(errors.top1_error, 1.);
    assert_eq!(errors.top5_error, 0.);
}

#[test]
fn true_class_outside_the_top_five() {
    // class 0 always scores lowest of seven
    let mut model = Oracle::new(7, |_, c| c as f32);
    let mut data = loader(labelled(&[0, 0, 6, 1], 7), 4);

    let errors = evaluate_errors(&mut model, data.iter()).unwrap();

    assert!((errors.top1_error - 0.75).abs() < 1e-6);
    // 0, 0 and 1 fall outside {6, 5, 4, 3, 2}
    assert!((errors.top5_error - 0.75).abs() < 1e-6);
}

#[test]
fn top5_error_never_exceeds_top1_error() {
    let mut model = Oracle::new(8, |label, c| ((label * 7 + c * 3) % 8) as f32);
    let labels: Vec<usize> = (0..40).map(|i| (i * 5) % 8).collect();
    let mut data = loader(labelled(&labels, 8), 6);

    let errors = evaluate_errors(&mut model, data.iter()).unwrap();

    assert!((0. ..=1.).contains(&errors.top1_error));
    assert!((0. ..=1.).contains(&errors.top5_error));
    assert!(errors.top5_error <= errors.top1_error);
}

#[test]
fn empty_data_is_an_error() {
    let mut model = Oracle::new(2, |_, _| 0.);
    let mut data = loader(labelled(&[], 2), 4);
    let mut optimizer = GradientDescent::new(0.1);

    assert!(matches!(
        evaluate(&mut model, data.iter()),
        Err(TrainErr::EmptyDataset { .. })
    ));
    assert!(matches!(
        evaluate_errors(&mut model, data.iter()),
        Err(TrainErr::EmptyDataset { .. })
    ));
    assert!(matches!(
        train_epoch(&mut model, data.iter(), &CrossEntropy, &mut optimizer),
        Err(TrainErr::EmptyDataset { .. })
    ));
}

#[test]
fn passes_restore_the_model_mode() {
    let mut model = Oracle::new(2, |_, _| 0.);
    let mut data = loader(labelled(&[0, 1], 2), 1);
    let mut optimizer = GradientDescent::new(0.1);

    model.set_mode(Mode::Eval);
    model.set_grad_enabled(false);
    train_epoch(&mut model, data.iter(), &CrossEntropy, &mut optimizer).unwrap();
    assert_eq!(model.mode(), Mode::Eval);
    assert!(!model.grad_enabled());

    model.set_mode(Mode::Train);
    model.set_grad_enabled(true);
    evaluate(&mut model, data.iter()).unwrap();
    assert_eq!(model.mode(), Mode::Train);
    assert!(model.grad_enabled());
}

#[test]
fn epoch_loss_does_not_depend_on_batching() {
    let mut rng = StdRng::seed_from_u64(11);
    let blobs = Blobs::new(3, 4, 2., &mut rng).unwrap();
    let dataset = blobs.sample(10, &mut rng).unwrap();
    let layers = [
        Layer::dense((3, 5), Some(ActFn::sigmoid(1.))),
        Layer::dense((5, 4), None),
    ];
    let mut model = Sequential::new(layers, &mut rng).unwrap();

    // a zero learning rate leaves the parameters untouched
    let mut optimizer = GradientDescent::new(0.);
    let losses: Vec<f32> = [1, 3, 4, 10]
        .into_iter()
        .map(|batch_size| {
            let mut data = loader(dataset.clone(), batch_size);
            train_epoch(&mut model, data.iter(), &CrossEntropy, &mut optimizer).unwrap()
        })
        .collect();

    for loss in &losses[1..] {
        assert!((loss - losses[0]).abs() < 1e-4, "losses: {losses:?}");
    }
}

#[test]
fn zero_epochs_only_report_the_final_errors() {
    let mut train = loader(labelled(&[0, 1], 2), 2);
    let mut test = loader(labelled(&[0, 1, 1, 1], 2), 2);
    let mut reporter = ConsoleReporter::new(Vec::new(), Palette::PLAIN);

    let summary = run(
        |n| Ok(Oracle::new(n, |_, c| c as f32)),
        &mut train,
        &mut test,
        2,
        0,
        &mut reporter,
    )
    .unwrap();

    assert!(summary.epochs.is_empty());
    assert_eq!(
        printed(reporter),
        "[SUCCESS] Training complete!\n\
         \t\tFinal Top-1 Error: 0.2500\n\
         \t\tFinal Top-5 Error: 0.0000\n"
    );
}

#[test]
fn every_epoch_is_reported_before_the_final_errors() {
    let mut train = loader(labelled(&[0, 1, 2], 3), 2);
    let mut test = loader(labelled(&[0, 1, 2], 3), 2);
    let mut recorder = Recorder::default();

    let summary = run(
        |n| Ok(Oracle::new(n, |label, c| if c == label { 1. } else { 0. })),
        &mut train,
        &mut test,
        3,
        3,
        &mut recorder,
    )
    .unwrap();

    let reported: Vec<(usize, usize)> = recorder
        .epochs
        .iter()
        .map(|r| (r.epoch, r.num_epochs))
        .collect();
    assert_eq!(reported, [(1, 3), (2, 3), (3, 3)]);
    assert_eq!(recorder.finished, [summary.errors]);
    assert!(summary.epochs.iter().all(|m| m.accuracy == 1.));
}

#[test]
fn the_factory_gets_the_amount_of_classes() {
    let mut train = loader(labelled(&[0], 6), 1);
    let mut test = loader(labelled(&[5], 6), 1);
    let mut reporter = Recorder::default();

    let summary = run(
        |n| {
            assert_eq!(n, 6);
            Ok(Oracle::new(n, |label, c| if c == label { 1. } else { 0. }))
        },
        &mut train,
        &mut test,
        6,
        1,
        &mut reporter,
    )
    .unwrap();

    assert_eq!(summary.errors.top1_error, 0.);
}

#[test]
fn training_on_blobs_lowers_the_loss() {
    let mut rng = StdRng::seed_from_u64(5);
    let blobs = Blobs::new(2, 3, 5., &mut rng).unwrap();
    let mut train = loader(blobs.sample(300, &mut rng).unwrap(), 16)
        .shuffled(StdRng::seed_from_u64(6));
    let mut test = loader(blobs.sample(90, &mut rng).unwrap(), 32);
    let mut reporter = Recorder::default();
    let options = RunOptions {
        num_epochs: 10,
        learning_rate: 0.01,
        device: Some(Device::Cpu),
    };

    let summary = run_with(
        |n| {
            let layers = [
                Layer::dense((2, 16), Some(ActFn::relu())),
                Layer::dense((16, n), None),
            ];
            Sequential::new(layers, &mut StdRng::seed_from_u64(7))
        },
        &mut train,
        &mut test,
        3,
        &options,
        &mut reporter,
    )
    .unwrap();

    let first = summary.epochs[0].loss;
    let last = summary.epochs[9].loss;

    assert_eq!(summary.epochs.len(), 10);
    assert!(last < first, "first: {first}, last: {last}");
    assert!(summary.errors.top5_error == 0.);
}
