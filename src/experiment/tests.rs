#[cfg(test)]
mod experiment_tests {
    use crate::data::Matrix;
    use crate::errors::CausalBenchError;
    use crate::experiment::Experiment;
    use crate::mechanism::{
        Assignment, CateSpec, MainEffect, MechanismSpec, NoiseSpec, OutcomeSpec, Propensity, ProxyGroup, ProxySpec,
        TreatmentEffect,
    };
    use crate::model::CausalModel;
    use crate::table::ResultTable;
    use rand::rngs::StdRng;
    use tempfile::{tempdir, TempDir};

    struct ConstantModel {
        name: String,
        value: f64,
        fitted_width: usize,
    }

    impl ConstantModel {
        fn new(name: &str, value: f64) -> Self {
            ConstantModel {
                name: name.to_string(),
                value,
                fitted_width: 0,
            }
        }
    }

    impl CausalModel for ConstantModel {
        fn name(&self) -> &str {
            &self.name
        }

        fn fit(&mut self, x: &Matrix<f64>, _w: &[f64], _y: &[f64], _rng: &mut StdRng) -> Result<(), CausalBenchError> {
            self.fitted_width = x.cols;
            Ok(())
        }

        fn estimate_causal_effect(&self, x: &Matrix<f64>) -> Result<Vec<f64>, CausalBenchError> {
            if self.fitted_width == 0 {
                return Err(CausalBenchError::NotFitted(self.name.clone()));
            }
            if x.cols != self.fitted_width {
                return Err(CausalBenchError::LengthMismatch(self.fitted_width, x.cols));
            }
            Ok(vec![self.value; x.rows])
        }
    }

    fn constant_cate_spec(c: f64) -> MechanismSpec {
        MechanismSpec {
            main_effect: MainEffect::Linear {
                feature: 0,
                slope: 1.0,
                intercept: 0.0,
            },
            treatment_effect: TreatmentEffect::Constant { value: c },
            propensity: Propensity::Constant { p: 0.5 },
            noise: NoiseSpec::Gaussian { std: 0.1 },
            assignment: Assignment::Bernoulli,
            outcome: OutcomeSpec::Additive,
            cate: CateSpec::TreatmentEffect,
            proxy: ProxySpec::Identity,
        }
    }

    fn experiment(seed: u64) -> (TempDir, Experiment) {
        let dir = tempdir().unwrap();
        let experiment = Experiment::with_root(Some(seed), None, dir.path()).unwrap();
        (dir, experiment)
    }

    #[test]
    fn test_directory_name() {
        let dir = tempdir().unwrap();
        let seeded = Experiment::with_root(Some(3), Some("demo".to_string()), dir.path()).unwrap();
        let name = seeded.directory().file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("experiment_seeded_3_"));
        assert!(name.ends_with("_demo"));
        assert!(seeded.directory().is_dir());

        let randomized = Experiment::with_root(None, None, dir.path()).unwrap();
        let name = randomized.directory().file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("experiment_randomized_"));

        assert!(Experiment::with_root(None, Some("a/b".to_string()), dir.path()).is_err());
    }

    #[test]
    fn test_run_validation() {
        let (_dir, mut experiment) = experiment(0);
        assert!(matches!(
            experiment.run(false, false, false),
            Err(CausalBenchError::NoGenerators)
        ));
        let (_dir, experiment) = self::experiment(0);
        let mut experiment = experiment.add_all_effects_generator(2, 50).unwrap();
        assert!(matches!(experiment.run(false, false, false), Err(CausalBenchError::NoModels)));
        let mut experiment = experiment.add_difference_in_means().unwrap();
        assert!(matches!(experiment.run(false, false, false), Err(CausalBenchError::NoMetrics)));
        assert!(!experiment.is_trained());
        assert!(experiment.results().is_empty());
    }

    #[test]
    fn test_constant_metric_fills_every_cell() {
        let (_dir, experiment) = experiment(1);
        let mut experiment = experiment
            .add_all_effects_generator(3, 100)
            .unwrap()
            .add_difference_in_means()
            .unwrap()
            .add_t_learner(1.0)
            .unwrap()
            .add_custom_metric("k", |_, _| 0.7)
            .unwrap()
            .add_custom_metric("other k", |_, _| -2.0)
            .unwrap();
        experiment.run(false, false, false).unwrap();
        let table = &experiment.results()[0];
        assert_eq!(table.index_name, "method_name");
        assert_eq!(table.methods, vec!["Difference in Means 0", "T-Learner 1"]);
        assert_eq!(table.metrics, vec!["k", "other k"]);
        for row in table.values.iter() {
            assert_eq!(row, &vec![0.7, -2.0]);
        }
    }

    #[test]
    fn test_unweighted_average_across_generators() {
        let (a, b) = (0.4, 1.6);
        let (_dir, experiment) = experiment(2);
        let mut experiment = experiment
            .add_custom_generated_data(constant_cate_spec(a), 2, vec![], 50, Some("small".to_string()))
            .unwrap()
            .add_custom_generated_data(constant_cate_spec(b), 2, vec![], 500, Some("large".to_string()))
            .unwrap()
            .add_custom_model(ConstantModel::new("zero", 0.0))
            .unwrap()
            .add_true_ate()
            .add_ate_error();
        experiment.run(false, false, false).unwrap();
        let table = &experiment.results()[0];
        let expected = (a + b) / 2.0;
        assert!((table.get("zero", "True ATE").unwrap().unwrap() - expected).abs() < 1e-12);
        assert!((table.get("zero", "eATE").unwrap().unwrap() - expected).abs() < 1e-12);
        assert!((experiment.get_result().unwrap() - expected).abs() < 1e-12);
    }

    #[test]
    fn test_true_ate_converges_to_constant_effect() {
        let (_dir, experiment) = experiment(3);
        let mut experiment = experiment
            .add_custom_generated_data(constant_cate_spec(0.3), 2, vec![], 2000, None)
            .unwrap()
            .add_difference_in_means()
            .unwrap()
            .add_all_metrics();
        experiment.run(false, false, false).unwrap();
        let table = &experiment.results()[0];
        assert_eq!(
            table.metrics,
            vec!["eATE", "eATE (%)", "True ATE", "Est. ATE", "PEHE (MSE)", "PEHE (MAE)"]
        );
        let true_ate = table.get("Difference in Means 0", "True ATE").unwrap().unwrap();
        assert!((true_ate - 0.3).abs() < 1e-12);
        let estimated = table.get("Difference in Means 0", "Est. ATE").unwrap().unwrap();
        assert!((estimated - 0.3).abs() < 0.1, "estimated {estimated}");
    }

    #[test]
    fn test_zero_true_ate_fails_percent_error() {
        let (_dir, experiment) = experiment(4);
        let mut experiment = experiment
            .add_no_treatment_effect_generator(2, 100)
            .unwrap()
            .add_difference_in_means()
            .unwrap()
            .add_ate_percent_error();
        assert!(matches!(
            experiment.run(false, false, false),
            Err(CausalBenchError::ZeroTrueAte)
        ));
        assert!(!experiment.is_trained());
        assert!(experiment.results().is_empty());
    }

    #[test]
    fn test_non_finite_score_fails_the_run() {
        let (_dir, experiment) = experiment(12);
        let mut experiment = experiment
            .add_all_effects_generator(2, 50)
            .unwrap()
            .add_custom_model(ConstantModel::new("constant", 1.0))
            .unwrap()
            .add_custom_metric("ratio", |_, _| f64::NAN)
            .unwrap();
        assert!(matches!(
            experiment.run(false, false, false),
            Err(CausalBenchError::NonFiniteScore { .. })
        ));
        assert!(experiment.results().is_empty());
    }

    #[test]
    fn test_non_finite_prediction_fails_the_run() {
        let (_dir, experiment) = experiment(13);
        let mut experiment = experiment
            .add_all_effects_generator(2, 50)
            .unwrap()
            .add_custom_model(ConstantModel::new("unbounded", f64::INFINITY))
            .unwrap()
            .add_ate_error();
        assert!(matches!(
            experiment.run(false, false, false),
            Err(CausalBenchError::NonFinitePrediction { row: 0, .. })
        ));
        assert!(!experiment.is_trained());
    }

    #[test]
    fn test_specific_set_rejects_short_matrix() {
        let (_dir, experiment) = experiment(14);
        let mut experiment = experiment
            .add_all_effects_generator(2, 50)
            .unwrap()
            .add_t_learner(1.0)
            .unwrap()
            .add_ate_error();
        experiment.run(false, false, false).unwrap();
        // Three rows of two proxies need six values.
        let data = vec![0.1, 0.2, 0.3, 0.4];
        assert!(matches!(
            experiment.test_specific_set(&Matrix::new(&data, 3, 2), &[1.0, 1.0, 1.0]),
            Err(CausalBenchError::LengthMismatch(6, 4))
        ));
        assert_eq!(experiment.results().len(), 1);
    }

    #[test]
    fn test_specific_set_requires_training() {
        let (_dir, experiment) = experiment(5);
        let mut experiment = experiment
            .add_all_effects_generator(2, 100)
            .unwrap()
            .add_custom_model(ConstantModel::new("half", 0.5))
            .unwrap()
            .add_s_learner(1.0)
            .unwrap()
            .add_all_metrics();
        let data = vec![0.1, 0.5, 0.9, 0.2, 0.4, 0.6];
        let features = Matrix::new(&data, 3, 2);
        let truth = vec![1.0, 2.0, 3.0];
        assert!(matches!(
            experiment.test_specific_set(&features, &truth),
            Err(CausalBenchError::NotTrained)
        ));

        experiment.run(false, false, false).unwrap();
        experiment.test_specific_set(&features, &truth).unwrap();
        assert_eq!(experiment.results().len(), 2);
        assert_eq!(experiment.count(), 1);
        let table = &experiment.results()[1];
        assert_eq!(table.rows(), 2);
        assert_eq!(table.get("half", "True ATE").unwrap(), Some(2.0));
        assert_eq!(table.get("half", "eATE").unwrap(), Some(1.5));
        assert!(experiment
            .directory()
            .join("table_comparing_specific_value_1.csv")
            .exists());
        // The first table is still the averaged one.
        assert_eq!(experiment.results()[0].rows(), 2);
    }

    #[test]
    fn test_run_persists_files() {
        let (_dir, experiment) = experiment(6);
        let mut experiment = experiment
            .add_all_effects_generator(2, 60)
            .unwrap()
            .add_spiked_generator(5, 60)
            .unwrap()
            .add_t_learner(1.0)
            .unwrap()
            .add_all_metrics();
        experiment.run(true, true, false).unwrap();

        let first = experiment.directory().join("generator_0_all_effects");
        assert!(first.join("data_0.csv").exists());
        assert!(first.join("diagnostics_0.json").exists());
        assert!(first.join("table_0.csv").exists());
        let second = experiment.directory().join("generator_1_spiked_generator");
        assert!(second.join("data_0.csv").exists());

        let loaded = ResultTable::load_table(experiment.directory().join("final_table.csv")).unwrap();
        assert_eq!(loaded, experiment.results()[0]);

        // A second run writes the next generation of every generator.
        experiment.run(true, false, false).unwrap();
        assert!(first.join("data_1.csv").exists());
        assert!(first.join("table_1.csv").exists());
        assert!(!first.join("diagnostics_1.json").exists());
        assert_eq!(experiment.results().len(), 2);
    }

    #[test]
    fn test_seeded_runs_are_reproducible() {
        let build = |seed| {
            let (dir, experiment) = experiment(seed);
            let mut experiment = experiment
                .add_all_effects_generator(3, 80)
                .unwrap()
                .add_s_learner(1.0)
                .unwrap()
                .add_t_learner(1.0)
                .unwrap()
                .add_all_metrics();
            experiment.run(false, false, false).unwrap();
            (dir, experiment.results()[0].clone())
        };
        let (_a_dir, a) = build(9);
        let (_b_dir, b) = build(9);
        assert_eq!(a, b);
    }

    #[test]
    fn test_proxy_width_reaches_models() {
        let spec = constant_cate_spec(1.0).set_proxy(ProxySpec::Groups(vec![
            ProxyGroup::replicated(0, 3),
            ProxyGroup::noisy(1, 2, 0.1),
        ]));
        let (_dir, experiment) = experiment(7);
        let mut experiment = experiment
            .add_custom_generated_data(spec, 4, vec![], 50, None)
            .unwrap()
            .add_custom_model(ConstantModel::new("constant", 1.0))
            .unwrap()
            .add_pehe_mse();
        experiment.run(false, false, false).unwrap();
        assert_eq!(experiment.results()[0].values[0], vec![0.0]);
        // The model saw the five proxy columns, not the four raw features.
        let raw = vec![0.0; 4];
        assert!(matches!(
            experiment.test_specific_set(&Matrix::new(&raw, 1, 4), &[1.0]),
            Err(CausalBenchError::LengthMismatch(5, 4))
        ));
        let data = vec![0.0; 5];
        experiment
            .test_specific_set(&Matrix::new(&data, 1, 5), &[1.0])
            .unwrap();
    }

    #[test]
    fn test_duplicate_model_and_metric_replacement() {
        let (_dir, experiment) = experiment(8);
        let experiment = experiment.add_custom_model(ConstantModel::new("m", 0.0)).unwrap();
        assert!(matches!(
            experiment.add_custom_model(ConstantModel::new("m", 1.0)),
            Err(CausalBenchError::DuplicateModel(_))
        ));

        let (_dir, experiment) = self::experiment(8);
        let experiment = experiment
            .add_all_metrics()
            .add_custom_metric("True ATE", |_, _| 1.0)
            .unwrap();
        assert_eq!(experiment.metric_names().len(), 6);
        assert_eq!(experiment.metric_names()[2], "True ATE");
        assert!(experiment.add_custom_metric("", |_, _| 1.0).is_err());
    }

    #[test]
    fn test_clear_and_reset() {
        let (_dir, experiment) = experiment(10);
        let mut experiment = experiment
            .add_all_effects_generator(2, 40)
            .unwrap()
            .add_difference_in_means()
            .unwrap()
            .add_ate_error();
        experiment.run(false, false, false).unwrap();
        assert!(experiment.get_result().is_ok());

        experiment.clear();
        assert!(!experiment.is_trained());
        assert!(matches!(experiment.get_result(), Err(CausalBenchError::NoResults)));
        assert_eq!(experiment.model_names().len(), 1);
        assert!(matches!(
            experiment.run(false, false, false),
            Err(CausalBenchError::NoGenerators)
        ));

        let old = experiment.directory().to_path_buf();
        experiment.reset(Some(11)).unwrap();
        assert_eq!(experiment.seed(), Some(11));
        assert!(experiment.model_names().is_empty());
        assert!(experiment.metric_names().is_empty());
        assert_ne!(experiment.directory(), old.as_path());
    }

    #[test]
    fn test_fork_rng_is_seeded() {
        use rand::Rng;
        let (_dir, mut a) = experiment(12);
        let (_dir2, mut b) = experiment(12);
        let x: f64 = a.fork_rng().gen();
        let y: f64 = b.fork_rng().gen();
        assert_eq!(x, y);
    }
}
