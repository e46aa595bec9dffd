use clap::{Args, Subcommand};
use std::io::{self, BufRead, Write};

use rollcall::classes::ClassRepository;
use rollcall::ledger::{AttendanceLedger, AttendanceSession, AutoSave, Direction};
use rollcall::models::{AttendanceStatus, RosterOrder};

use super::{parse_date, resolve_class, OutputFormat};

#[derive(Args)]
pub struct AttendanceCommand {
    #[command(subcommand)]
    pub command: AttendanceSubcommand,
}

#[derive(Subcommand)]
pub enum AttendanceSubcommand {
    /// Take attendance interactively, one student at a time
    Take {
        /// Class ID or name
        class: String,

        /// Date (YYYY-MM-DD), defaults to today
        #[arg(long)]
        date: Option<String>,
    },

    /// Set one student's status
    Set {
        /// Class ID or name
        class: String,

        /// Roll number of the student
        roll: String,

        /// Present, Absent or Skipped
        status: AttendanceStatus,

        /// Date (YYYY-MM-DD), defaults to today
        #[arg(long)]
        date: Option<String>,
    },

    /// Flip a student between Present and Absent
    Toggle {
        /// Class ID or name
        class: String,

        /// Roll number of the student
        roll: String,

        /// Date (YYYY-MM-DD), defaults to today
        #[arg(long)]
        date: Option<String>,
    },

    /// Show the attendance recorded for a date
    Show {
        /// Class ID or name
        class: String,

        /// Date (YYYY-MM-DD), defaults to today
        #[arg(long)]
        date: Option<String>,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// List dates with recorded attendance
    Dates {
        /// Class ID or name
        class: String,
    },

    /// Show present/absent/skipped counts per date
    Stats {
        /// Class ID or name
        class: String,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },
}

impl AttendanceCommand {
    pub async fn run(
        &self,
        repo: &ClassRepository,
        ledger: &AttendanceLedger,
        order: RosterOrder,
    ) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            AttendanceSubcommand::Take { class, date } => {
                let class = resolve_class(repo, class).await?;
                let date = parse_date(date.as_ref())?;

                let mut session = AttendanceSession::open(ledger, &class, date, order).await;
                let stdin = io::stdin();
                let mut stdout = io::stdout();
                take_attendance(&mut session, ledger, stdin.lock(), &mut stdout).await?;
                Ok(())
            }

            AttendanceSubcommand::Set {
                class,
                roll,
                status,
                date,
            } => {
                let class = resolve_class(repo, class).await?;
                let date = parse_date(date.as_ref())?;

                if !class.has_student(roll) {
                    return Err(format!("Student '{}' is not on the roster", roll).into());
                }
                if !ledger.set_status(&class.id, date, roll, *status).await {
                    return Err("Failed to save attendance".into());
                }
                println!("{} on {}: {}", roll, date, status);
                Ok(())
            }

            AttendanceSubcommand::Toggle { class, roll, date } => {
                let class = resolve_class(repo, class).await?;
                let date = parse_date(date.as_ref())?;

                let mut session = AttendanceSession::open(ledger, &class, date, order).await;
                let status = session.toggle(roll)?;
                if !session.commit(ledger).await {
                    return Err("Failed to save attendance".into());
                }
                println!("{} on {}: {}", roll, date, status);
                Ok(())
            }

            AttendanceSubcommand::Show {
                class,
                date,
                format,
            } => {
                let class = resolve_class(repo, class).await?;
                let date = parse_date(date.as_ref())?;
                let entries = ledger.get_entries_for_date(&class.id, date).await;

                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(&entries)?);
                    }
                    OutputFormat::Text => {
                        println!("{} on {}", class.name, date);
                        println!();
                        for student in class.ordered_roster(order) {
                            let status = entries
                                .get(&student.roll_number)
                                .map(|s| s.to_string())
                                .unwrap_or_else(|| "-".to_string());
                            println!("  {:<10}  {:<30}  {}", student.roll_number, student.name, status);
                        }
                        for (roll, status) in &entries {
                            if !class.has_student(roll) {
                                println!("  {:<10}  {:<30}  {}", roll, "(not on roster)", status);
                            }
                        }
                        println!();
                        println!("{}", rollcall::models::DailyStats::from_entries(&entries));
                    }
                }
                Ok(())
            }

            AttendanceSubcommand::Dates { class } => {
                let class = resolve_class(repo, class).await?;
                let dates = ledger.recorded_dates(&class.id).await;
                if dates.is_empty() {
                    println!("No attendance recorded for '{}'", class.name);
                    return Ok(());
                }
                for date in &dates {
                    println!("{}", date);
                }
                Ok(())
            }

            AttendanceSubcommand::Stats { class, format } => {
                let class = resolve_class(repo, class).await?;
                let stats = ledger.stats_by_date(&class.id).await;

                match format {
                    OutputFormat::Json => {
                        let by_date: std::collections::BTreeMap<_, _> = stats.into_iter().collect();
                        println!("{}", serde_json::to_string_pretty(&by_date)?);
                    }
                    OutputFormat::Text => {
                        if stats.is_empty() {
                            println!("No attendance recorded for '{}'", class.name);
                            return Ok(());
                        }
                        println!("{:<12}  {:>7}  {:>6}  {:>7}", "DATE", "PRESENT", "ABSENT", "SKIPPED");
                        println!("{}", "-".repeat(40));
                        for (date, day) in &stats {
                            println!(
                                "{:<12}  {:>7}  {:>6}  {:>7}",
                                date.to_string(),
                                day.present,
                                day.absent,
                                day.skipped
                            );
                        }
                    }
                }
                Ok(())
            }
        }
    }
}

const HELP: &str = "p present, a absent, s skip, n next, b back, j <roll> jump, w save, q quit";

/// Drives a session from line-based input until quit or end of input.
///
/// The date is written as soon as every student has a status, and on `w`.
async fn take_attendance<R: BufRead, W: Write>(
    session: &mut AttendanceSession,
    ledger: &AttendanceLedger,
    mut input: R,
    out: &mut W,
) -> io::Result<()> {
    if !session.has_students() {
        writeln!(out, "No students in this class")?;
        return Ok(());
    }

    writeln!(out, "Taking attendance for {}", session.date())?;
    writeln!(out, "{}", HELP)?;

    let mut confirm_quit = false;
    loop {
        if let Some(student) = session.current_student() {
            let status = session
                .status_of(&student.roll_number)
                .map(|s| s.to_string())
                .unwrap_or_else(|| "-".to_string());
            write!(
                out,
                "[{}/{} {:.0}%] {} [{}] > ",
                session.cursor() + 1,
                session.roster().len(),
                session.progress() * 100.0,
                student,
                status
            )?;
            out.flush()?;
        }

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            writeln!(out)?;
            if session.is_dirty() {
                writeln!(out, "Unsaved changes discarded.")?;
            }
            break;
        }

        let mut parts = line.split_whitespace();
        let command = parts.next().unwrap_or("");
        if command != "q" {
            confirm_quit = false;
        }

        match command {
            "p" | "a" | "s" => {
                let status = match command {
                    "p" => AttendanceStatus::Present,
                    "a" => AttendanceStatus::Absent,
                    _ => AttendanceStatus::Skipped,
                };
                match session.mark_current(status) {
                    Ok(student) => {
                        let label = student.to_string();
                        writeln!(out, "{}: {}", label, status)?;
                    }
                    Err(e) => writeln!(out, "{}", e)?,
                }
                match session.auto_save_if_complete(ledger).await {
                    AutoSave::Saved => writeln!(out, "All students marked. Attendance saved.")?,
                    AutoSave::Failed => writeln!(out, "Failed to save attendance.")?,
                    AutoSave::Incomplete => {}
                }
            }
            "n" => {
                session.advance_cursor(Direction::Next);
            }
            "b" => {
                session.advance_cursor(Direction::Previous);
            }
            "j" => match parts.next() {
                Some(roll) if session.jump_to(roll) => {}
                Some(roll) => writeln!(out, "Student not found: {}", roll)?,
                None => writeln!(out, "Usage: j <roll>")?,
            },
            "w" => {
                if session.commit(ledger).await {
                    writeln!(out, "Attendance saved.")?;
                } else {
                    writeln!(out, "Failed to save attendance.")?;
                }
            }
            "q" => {
                if session.is_dirty() && !confirm_quit {
                    writeln!(out, "Unsaved changes. Press w to save or q again to discard.")?;
                    confirm_quit = true;
                } else {
                    break;
                }
            }
            "" => {}
            _ => writeln!(out, "{}", HELP)?,
        }
    }

    writeln!(out, "{}", session.stats())?;
    let skipped = session.skipped_students();
    if !skipped.is_empty() {
        writeln!(out, "Skipped:")?;
        for student in skipped {
            writeln!(out, "  {}", student)?;
        }
    }
    let unmarked = session.unmarked_students();
    if !unmarked.is_empty() {
        writeln!(out, "Not marked: {} student(s)", unmarked.len())?;
    }
    Ok(())
}
