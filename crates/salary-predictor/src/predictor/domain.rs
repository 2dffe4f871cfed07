use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Seniority bucket understood by the prediction model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExperienceLevel {
    #[serde(rename = "EN")]
    Entry,
    #[serde(rename = "MI")]
    Mid,
    #[serde(rename = "SE")]
    Senior,
    #[serde(rename = "EX")]
    Executive,
}

impl ExperienceLevel {
    pub const ALL: [ExperienceLevel; 4] = [
        ExperienceLevel::Entry,
        ExperienceLevel::Mid,
        ExperienceLevel::Senior,
        ExperienceLevel::Executive,
    ];

    pub fn code(self) -> &'static str {
        match self {
            ExperienceLevel::Entry => "EN",
            ExperienceLevel::Mid => "MI",
            ExperienceLevel::Senior => "SE",
            ExperienceLevel::Executive => "EX",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ExperienceLevel::Entry => "Entry Level",
            ExperienceLevel::Mid => "Mid Level",
            ExperienceLevel::Senior => "Senior",
            ExperienceLevel::Executive => "Executive",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CompanySize {
    #[serde(rename = "S")]
    Small,
    #[serde(rename = "M")]
    Medium,
    #[serde(rename = "L")]
    Large,
}

impl CompanySize {
    pub const ALL: [CompanySize; 3] = [CompanySize::Small, CompanySize::Medium, CompanySize::Large];

    pub fn code(self) -> &'static str {
        match self {
            CompanySize::Small => "S",
            CompanySize::Medium => "M",
            CompanySize::Large => "L",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            CompanySize::Small => "Small",
            CompanySize::Medium => "Medium",
            CompanySize::Large => "Large",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EmploymentType {
    #[serde(rename = "FT")]
    FullTime,
    #[serde(rename = "PT")]
    PartTime,
}

impl EmploymentType {
    pub const ALL: [EmploymentType; 2] = [EmploymentType::FullTime, EmploymentType::PartTime];

    pub fn code(self) -> &'static str {
        match self {
            EmploymentType::FullTime => "FT",
            EmploymentType::PartTime => "PT",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            EmploymentType::FullTime => "Full Time",
            EmploymentType::PartTime => "Part Time",
        }
    }
}

/// Job titles the model was trained on. Codes and labels coincide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JobTitle {
    #[serde(rename = "Data Engineer")]
    DataEngineer,
    #[serde(rename = "Data Manager")]
    DataManager,
    #[serde(rename = "Data Scientist")]
    DataScientist,
    #[serde(rename = "Machine Learning Engineer")]
    MachineLearningEngineer,
}

impl JobTitle {
    pub const ALL: [JobTitle; 4] = [
        JobTitle::DataEngineer,
        JobTitle::DataManager,
        JobTitle::DataScientist,
        JobTitle::MachineLearningEngineer,
    ];

    pub fn code(self) -> &'static str {
        match self {
            JobTitle::DataEngineer => "Data Engineer",
            JobTitle::DataManager => "Data Manager",
            JobTitle::DataScientist => "Data Scientist",
            JobTitle::MachineLearningEngineer => "Machine Learning Engineer",
        }
    }

    pub fn label(self) -> &'static str {
        self.code()
    }
}

macro_rules! impl_code_parsing {
    ($($ty:ty => $field:expr),+ $(,)?) => {
        $(
            impl FromStr for $ty {
                type Err = SelectionError;

                fn from_str(raw: &str) -> Result<Self, Self::Err> {
                    Self::ALL
                        .into_iter()
                        .find(|candidate| candidate.code() == raw)
                        .ok_or_else(|| SelectionError::InvalidValue {
                            field: $field,
                            value: raw.to_string(),
                        })
                }
            }

            impl fmt::Display for $ty {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.write_str(self.code())
                }
            }
        )+
    };
}

impl_code_parsing!(
    ExperienceLevel => FormField::ExperienceLevel,
    CompanySize => FormField::CompanySize,
    EmploymentType => FormField::EmploymentType,
    JobTitle => FormField::JobTitle,
);

/// Identifies one of the four selects on the form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormField {
    ExperienceLevel,
    CompanySize,
    EmploymentType,
    JobTitle,
}

impl FormField {
    pub const ALL: [FormField; 4] = [
        FormField::ExperienceLevel,
        FormField::CompanySize,
        FormField::EmploymentType,
        FormField::JobTitle,
    ];

    /// Wire name, shared by the JSON request body and the HTML form.
    pub fn key(self) -> &'static str {
        match self {
            FormField::ExperienceLevel => "experience_level",
            FormField::CompanySize => "company_size",
            FormField::EmploymentType => "employment_type",
            FormField::JobTitle => "job_title",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            FormField::ExperienceLevel => "Experience Level",
            FormField::CompanySize => "Company Size",
            FormField::EmploymentType => "Employment Type",
            FormField::JobTitle => "Job Title",
        }
    }

    pub fn placeholder(self) -> &'static str {
        match self {
            FormField::ExperienceLevel => "Select experience level",
            FormField::CompanySize => "Select company size",
            FormField::EmploymentType => "Select employment type",
            FormField::JobTitle => "Select job title",
        }
    }

    /// `(code, label)` pairs in display order.
    pub fn options(self) -> Vec<(&'static str, &'static str)> {
        match self {
            FormField::ExperienceLevel => ExperienceLevel::ALL
                .iter()
                .map(|value| (value.code(), value.label()))
                .collect(),
            FormField::CompanySize => CompanySize::ALL
                .iter()
                .map(|value| (value.code(), value.label()))
                .collect(),
            FormField::EmploymentType => EmploymentType::ALL
                .iter()
                .map(|value| (value.code(), value.label()))
                .collect(),
            FormField::JobTitle => JobTitle::ALL
                .iter()
                .map(|value| (value.code(), value.label()))
                .collect(),
        }
    }
}

impl FromStr for FormField {
    type Err = SelectionError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|field| field.key() == raw)
            .ok_or_else(|| SelectionError::UnknownField(raw.to_string()))
    }
}

impl fmt::Display for FormField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SelectionError {
    #[error("unknown form field '{0}'")]
    UnknownField(String),
    #[error("'{value}' is not a valid {field} option")]
    InvalidValue { field: FormField, value: String },
}

/// The user's current choices. `None` means the select still shows its placeholder.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FormSelection {
    pub experience_level: Option<ExperienceLevel>,
    pub company_size: Option<CompanySize>,
    pub employment_type: Option<EmploymentType>,
    pub job_title: Option<JobTitle>,
}

impl FormSelection {
    /// Applies one select change. An empty value resets the field to its placeholder.
    pub fn set(&mut self, field: FormField, raw: &str) -> Result<(), SelectionError> {
        let raw = raw.trim();
        let empty = raw.is_empty();
        match field {
            FormField::ExperienceLevel => {
                self.experience_level = if empty { None } else { Some(raw.parse()?) }
            }
            FormField::CompanySize => {
                self.company_size = if empty { None } else { Some(raw.parse()?) }
            }
            FormField::EmploymentType => {
                self.employment_type = if empty { None } else { Some(raw.parse()?) }
            }
            FormField::JobTitle => self.job_title = if empty { None } else { Some(raw.parse()?) },
        }
        Ok(())
    }

    /// Selected code for a field, or `""` when unset.
    pub fn value(&self, field: FormField) -> &'static str {
        match field {
            FormField::ExperienceLevel => self.experience_level.map_or("", ExperienceLevel::code),
            FormField::CompanySize => self.company_size.map_or("", CompanySize::code),
            FormField::EmploymentType => self.employment_type.map_or("", EmploymentType::code),
            FormField::JobTitle => self.job_title.map_or("", JobTitle::code),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.request().is_some()
    }

    /// Request body for a complete selection.
    pub fn request(&self) -> Option<PredictionRequest> {
        Some(PredictionRequest {
            experience_level: self.experience_level?,
            company_size: self.company_size?,
            employment_type: self.employment_type?,
            job_title: self.job_title?,
        })
    }
}

/// JSON body posted to `{base_url}/predict`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredictionRequest {
    pub experience_level: ExperienceLevel,
    pub company_size: CompanySize,
    pub employment_type: EmploymentType,
    pub job_title: JobTitle,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub salary_usd: f64,
    pub confidence: f64,
}
