use clap::Args;
use rand::rngs::StdRng;
use rand::SeedableRng;
use salary_predictor::config::AppConfig;
use salary_predictor::error::AppError;
use salary_predictor::prediction::{
    ArtifactCheck, ModelLoader, PredictionEngine, PredictionOutcome, PredictionSource,
    SalaryInput,
};
use salary_predictor::telemetry;

#[derive(Args, Debug)]
pub(crate) struct PredictArgs {
    /// Person's full name (2-50 characters)
    #[arg(long)]
    pub(crate) name: String,
    /// High School, Bachelor, Master or PhD
    #[arg(long)]
    pub(crate) education: String,
    /// Years of experience (0-50)
    #[arg(long)]
    pub(crate) experience: f64,
    /// Urban, Suburban or Rural
    #[arg(long)]
    pub(crate) location: String,
    /// Manager, Director, Analyst, Engineer, Consultant, Specialist, Developer or Designer
    #[arg(long)]
    pub(crate) job_title: String,
    /// Age (18-100)
    #[arg(long)]
    pub(crate) age: u32,
    /// Male, Female or Other
    #[arg(long)]
    pub(crate) gender: String,
    /// Seed the jitter for reproducible output
    #[arg(long)]
    pub(crate) seed: Option<u64>,
}

impl PredictArgs {
    fn to_input(&self) -> SalaryInput {
        SalaryInput {
            name: self.name.clone(),
            education: self.education.clone().into(),
            years_of_experience: self.experience,
            location: self.location.clone().into(),
            job_title: self.job_title.clone().into(),
            age: self.age,
            gender: self.gender.clone().into(),
        }
    }
}

pub(crate) fn run_predict(args: PredictArgs) -> Result<(), AppError> {
    let input = args.to_input();
    input.validate()?;

    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;
    let mut engine = PredictionEngine::load(ModelLoader::new(config.artifacts));
    if let Some(seed) = args.seed {
        engine = engine.with_rng(StdRng::seed_from_u64(seed));
    }

    let outcome = engine.predict(&input)?;
    render_prediction(&input, &outcome);
    Ok(())
}

pub(crate) fn run_status() -> Result<(), AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;
    let loader = ModelLoader::new(config.artifacts);
    let checks = loader.check();
    let engine = PredictionEngine::load(loader);
    let diagnostics = engine.diagnostics();

    println!("Salary predictor artifacts");
    println!(
        "Model:  {}",
        diagnostics.model_type.as_deref().unwrap_or("not loaded (mock mode)")
    );
    println!(
        "Scaler: {}",
        diagnostics.scaler_type.as_deref().unwrap_or("not loaded")
    );
    if let Some(count) = diagnostics.scaler_features_expected {
        let note = if diagnostics.feature_mismatch == Some(true) {
            " (MISMATCH: predictions will fail)"
        } else {
            ""
        };
        println!("Scaler features: {count}{note}");
    }

    println!("\nFiles");
    for check in &checks {
        println!("- {}", describe_check(check));
    }

    if let Some(metadata) = &diagnostics.metadata {
        println!("\nMetadata");
        for (key, value) in metadata {
            println!("- {key}: {value}");
        }
    }

    Ok(())
}

fn describe_check(check: &ArtifactCheck) -> String {
    match &check.outcome {
        Ok(()) => format!("{} {}: ok", check.artifact, check.path.display()),
        Err(err) => format!("{}: {err}", check.artifact),
    }
}

fn render_prediction(input: &SalaryInput, outcome: &PredictionOutcome) {
    let path = match outcome.source {
        PredictionSource::Model => "trained model",
        PredictionSource::Mock => "mock estimator (no model loaded)",
    };
    println!("Salary prediction for {}", input.name);
    println!(
        "{} | {} yrs | {} | {} | age {} | {}",
        input.education,
        input.years_of_experience,
        input.location,
        input.job_title,
        input.age,
        input.gender
    );
    println!("Predicted salary: ${:.2}", outcome.predicted_salary);
    println!("Confidence: {:.3}", outcome.confidence_score);
    println!("Source: {path}");
}
