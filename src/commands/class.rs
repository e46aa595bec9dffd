use clap::{Args, Subcommand};
use std::io::{self, Write};
use std::path::PathBuf;

use rollcall::classes::ClassRepository;
use rollcall::models::{Class, Student};
use rollcall::roster::ImportOutcome;

use super::{resolve_class, OutputFormat};

#[derive(Args)]
pub struct ClassCommand {
    #[command(subcommand)]
    pub command: ClassSubcommand,
}

#[derive(Subcommand)]
pub enum ClassSubcommand {
    /// List all classes
    List {
        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Show a class and its roster
    Show {
        /// Class ID or name
        class: String,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Create a new class
    Create {
        /// Name of the class
        name: String,

        /// Seed the roster from a CSV file (rollNumber, name, email columns)
        #[arg(long, value_name = "FILE")]
        csv: Option<PathBuf>,
    },

    /// Rename a class
    Rename {
        /// Class ID or name
        class: String,

        /// New name
        name: String,
    },

    /// Delete a class and all of its attendance
    Delete {
        /// Class ID or name
        class: String,

        /// Skip confirmation prompt
        #[arg(long, short)]
        force: bool,
    },

    /// Add a student to a class roster
    AddStudent {
        /// Class ID or name
        class: String,

        /// Student name
        #[arg(long)]
        name: String,

        /// Roll number (unique within the class)
        #[arg(long)]
        roll: String,

        /// Email address
        #[arg(long, default_value = "")]
        email: String,
    },

    /// Edit a student on a class roster
    EditStudent {
        /// Class ID or name
        class: String,

        /// Current roll number of the student
        roll: String,

        /// New name
        #[arg(long)]
        name: Option<String>,

        /// New roll number
        #[arg(long = "new-roll")]
        new_roll: Option<String>,

        /// New email address
        #[arg(long)]
        email: Option<String>,
    },

    /// Remove a student from a class roster
    RemoveStudent {
        /// Class ID or name
        class: String,

        /// Roll number of the student
        roll: String,
    },

    /// Append students from a CSV file to a class roster
    Import {
        /// Class ID or name
        class: String,

        /// CSV file with a rollNumber column
        file: PathBuf,
    },
}

impl ClassCommand {
    pub async fn run(&self, repo: &ClassRepository) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            ClassSubcommand::List { format } => {
                let classes = repo.list().await;

                if classes.is_empty() {
                    println!("No classes found");
                    return Ok(());
                }

                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(&classes)?);
                    }
                    OutputFormat::Text => {
                        println!("{:<15}  {:<30}  STUDENTS", "ID", "NAME");
                        println!("{}", "-".repeat(60));
                        for class in &classes {
                            let name = if class.name.chars().count() > 30 {
                                format!("{}...", class.name.chars().take(27).collect::<String>())
                            } else {
                                class.name.clone()
                            };
                            println!("{:<15}  {:<30}  {}", class.id, name, class.students.len());
                        }
                        println!("\nTotal: {} class(es)", classes.len());
                    }
                }
                Ok(())
            }

            ClassSubcommand::Show { class, format } => {
                let class = resolve_class(repo, class).await?;
                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(&class)?);
                    }
                    OutputFormat::Text => print_class(&class),
                }
                Ok(())
            }

            ClassSubcommand::Create { name, csv } => {
                let class = match csv {
                    Some(path) => {
                        let content = std::fs::read_to_string(path)
                            .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
                        let (class, outcome) = repo.create_from_csv(name, &content).await?;
                        print_import(&outcome);
                        class
                    }
                    None => repo.create(name, Vec::new()).await?,
                };
                println!("Created class:");
                print_class(&class);
                Ok(())
            }

            ClassSubcommand::Rename { class, name } => {
                let class = resolve_class(repo, class).await?;
                let renamed = repo.rename(&class.id, name).await?;
                println!("Renamed '{}' to '{}'", class.name, renamed.name);
                Ok(())
            }

            ClassSubcommand::Delete { class, force } => {
                let class = resolve_class(repo, class).await?;

                // Confirm deletion unless --force is used
                if !force {
                    print!(
                        "Delete class '{}' and all of its attendance? [y/N] ",
                        class.name
                    );
                    io::stdout().flush()?;

                    let mut input = String::new();
                    io::stdin().read_line(&mut input)?;

                    if !input.trim().eq_ignore_ascii_case("y") {
                        println!("Deletion cancelled.");
                        return Ok(());
                    }
                }

                repo.delete(&class.id).await?;
                println!("Deleted class: {}", class.name);
                Ok(())
            }

            ClassSubcommand::AddStudent {
                class,
                name,
                roll,
                email,
            } => {
                let class = resolve_class(repo, class).await?;
                let student = Student::new(name, roll, email);
                repo.add_student(&class.id, student.clone()).await?;
                println!("Added to '{}': {}", class.name, student.trimmed());
                Ok(())
            }

            ClassSubcommand::EditStudent {
                class,
                roll,
                name,
                new_roll,
                email,
            } => {
                if name.is_none() && new_roll.is_none() && email.is_none() {
                    return Err("Nothing to update. Provide at least one option.".into());
                }

                let class = resolve_class(repo, class).await?;
                let mut student = class
                    .student(roll)
                    .cloned()
                    .ok_or_else(|| format!("Student not found: {}", roll))?;

                if let Some(name) = name {
                    student.name = name.clone();
                }
                if let Some(new_roll) = new_roll {
                    student.roll_number = new_roll.clone();
                }
                if let Some(email) = email {
                    student.email = email.clone();
                }

                repo.update_student(&class.id, roll, student.clone()).await?;
                println!("Updated student: {}", student.trimmed());
                Ok(())
            }

            ClassSubcommand::RemoveStudent { class, roll } => {
                let class = resolve_class(repo, class).await?;
                repo.remove_student(&class.id, roll).await?;
                println!("Removed student {} from '{}'", roll, class.name);
                Ok(())
            }

            ClassSubcommand::Import { class, file } => {
                let class = resolve_class(repo, class).await?;
                let content = std::fs::read_to_string(file)
                    .map_err(|e| format!("Failed to read {}: {}", file.display(), e))?;
                let (updated, outcome) = repo.import_students(&class.id, &content).await?;
                print_import(&outcome);
                println!(
                    "'{}' now has {} student(s)",
                    updated.name,
                    updated.students.len()
                );
                Ok(())
            }
        }
    }
}

fn print_class(class: &Class) {
    println!("{}", class);
    if class.students.is_empty() {
        println!("  (no students)");
        return;
    }
    println!();
    println!("  {:<10}  {:<30}  EMAIL", "ROLL", "NAME");
    for student in &class.students {
        println!(
            "  {:<10}  {:<30}  {}",
            student.roll_number, student.name, student.email
        );
    }
}

fn print_import(outcome: &ImportOutcome) {
    println!("Imported {} student(s)", outcome.students.len());
    if !outcome.skipped.is_empty() {
        println!("Skipped {} row(s):", outcome.skipped.len());
        for row in &outcome.skipped {
            println!("  line {}: {}", row.line, row.reason);
        }
    }
}
