use clap::Args;
use salary_predictor::config::AppConfig;
use salary_predictor::error::AppError;
use salary_predictor::predictor::{
    FormField, HttpPredictionClient, PredictionError, PredictionForm, PredictionService,
};

#[derive(Args, Debug)]
pub(crate) struct PredictArgs {
    /// Experience level code: EN, MI, SE or EX
    #[arg(long)]
    pub(crate) experience_level: String,
    /// Company size code: S, M or L
    #[arg(long)]
    pub(crate) company_size: String,
    /// Employment type code: FT or PT
    #[arg(long)]
    pub(crate) employment_type: String,
    /// Job title, e.g. "Data Scientist"
    #[arg(long)]
    pub(crate) job_title: String,
    /// Override PREDICTION_API_URL
    #[arg(long)]
    pub(crate) api_url: Option<String>,
}

pub(crate) async fn run_predict(args: PredictArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;
    if let Some(api_url) = &args.api_url {
        config.prediction.override_base_url(api_url)?;
    }

    let client = HttpPredictionClient::new(&config.prediction)?;
    let (form, failure) = predict_once(&client, &args).await?;
    print!("{}", form.view().to_text());

    match failure {
        Some(err) => Err(err.into()),
        None => Ok(()),
    }
}

/// Fills a fresh form from the arguments and submits it once.
///
/// The form is returned even when the prediction fails so its error banner can be shown.
pub(crate) async fn predict_once<S>(
    service: &S,
    args: &PredictArgs,
) -> Result<(PredictionForm, Option<PredictionError>), AppError>
where
    S: PredictionService,
{
    let mut form = PredictionForm::new();
    form.select_field(FormField::ExperienceLevel, &args.experience_level)?;
    form.select_field(FormField::CompanySize, &args.company_size)?;
    form.select_field(FormField::EmploymentType, &args.employment_type)?;
    form.select_field(FormField::JobTitle, &args.job_title)?;

    let request = form.begin_submit()?;
    let outcome = service.predict(request).await;
    let failure = outcome.as_ref().err().cloned();
    form.resolve(outcome);
    Ok((form, failure))
}
