use anyhow::Result;
use course_admin::config::AdminConfig;
use course_admin::core::admin::{CourseAdmin, SubmitOutcome};
use course_admin::core::codec::TableCodec;
use course_admin::core::github::GithubContents;
use course_admin::core::repository::{BlobOutcome, CourseRepository};
use course_admin::core::store::TextStore;
use course_admin::error::store::StoreError;
use course_admin::model::course::Course;
use course_admin::utils::form::prompt_course;
use course_admin::utils::input::{choose, confirm, input_password_trim};
use dotenv::dotenv;
use log::{error, info, warn};
use simplelog::{ColorChoice, Config, LevelFilter, TermLogger, TerminalMode};

#[tokio::main]
async fn main() {
    // Loads GITHUB_TOKEN and friends from a `.env` file, if present.
    dotenv().ok();

    let level = std::env::var("COURSE_ADMIN_LOG")
        .ok()
        .and_then(|v| v.parse::<LevelFilter>().ok())
        .unwrap_or(LevelFilter::Info);
    if let Err(e) = TermLogger::init(level, Config::default(), TerminalMode::Mixed, ColorChoice::Auto) {
        eprintln!("warning: failed to initialise logging: {}", e);
    }

    if let Err(e) = run().await {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let config = AdminConfig::from_env(|| input_password_trim("GitHub token:").ok())?;
    info!("managing courses in {} ({})", config.repo, config.table_path);

    let store = GithubContents::new(&config)?;
    let repository = CourseRepository::new(store, &config.table_path, TableCodec::new(&config.variable));
    let admin = CourseAdmin::new(repository);

    loop {
        // 每次操作前重新拉取课程列表
        let courses = match admin.courses().await {
            Ok(courses) => {
                if courses.is_empty() {
                    warn!("No courses found in the repository.");
                }
                courses
            }
            Err(e) => {
                error!("Error loading courses from GitHub: {}", e);
                Vec::new()
            }
        };

        println!("\n=== Admin Course Management ({} courses) ===", courses.len());
        let action = match choose(
            "What would you like to do?",
            &["Add / Modify Course", "Delete Course", "List Courses", "Quit"],
            None,
        ) {
            Ok(action) => action,
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(()),
            Err(e) => return Err(e.into()),
        };

        let result = match action {
            0 => add_or_modify(&admin, &courses).await,
            1 => delete(&admin, &courses).await,
            2 => {
                print_courses(&courses);
                Ok(())
            }
            _ => return Ok(()),
        };

        if let Err(e) = result {
            if is_end_of_input(&e) {
                return Ok(());
            }
            println!("❌ {:#}", e);
        }
    }
}

fn is_end_of_input(e: &anyhow::Error) -> bool {
    e.downcast_ref::<std::io::Error>()
        .is_some_and(|io| io.kind() == std::io::ErrorKind::UnexpectedEof)
}

fn print_courses(courses: &[Course]) {
    for course in courses {
        let semesters: Vec<&str> = course.semesters.iter().map(|s| s.label()).collect();
        println!(
            "- {} | {} | {} / {} | {} | {}",
            course.name,
            course.label,
            course.category,
            course.subcategory,
            semesters.join(", "),
            course.file_path
        );
    }
}

async fn add_or_modify<S: TextStore>(admin: &CourseAdmin<S>, courses: &[Course]) -> Result<()> {
    let mut options = vec!["(add a new course)".to_string()];
    options.extend(courses.iter().map(|c| format!("{} - {}", c.name, c.label)));
    let picked = choose("Select a Course to Modify (or add a new course)", &options, Some(0))?;
    let selected = picked.checked_sub(1).and_then(|i| courses.get(i));

    if let Some(course) = selected {
        println!("Modifying: {}", course.name);
    }
    let draft = prompt_course(selected).await?;

    let outcome = match admin.submit(draft, selected.map(|c| c.name.as_str())).await {
        Ok(outcome) => outcome,
        Err(StoreError::Validation(message)) => {
            println!("❌ {}", message);
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };
    report_submit(&outcome, selected.is_some());
    Ok(())
}

fn report_submit(outcome: &SubmitOutcome, is_update: bool) {
    match &outcome.blob {
        Some(Ok(_)) => println!("✅ PDF uploaded successfully to {}", outcome.record.file_path),
        Some(Err(e)) => println!("❌ Error uploading PDF: {}", e),
        None => {}
    }
    match &outcome.table {
        Ok(receipt) => println!(
            "✅ Course {} {} (commit {})",
            outcome.record.name,
            if is_update { "updated" } else { "added" },
            receipt.commit
        ),
        Err(e) => println!("❌ Error saving course list: {}", e),
    }
}

async fn delete<S: TextStore>(admin: &CourseAdmin<S>, courses: &[Course]) -> Result<()> {
    if courses.is_empty() {
        println!("Nothing to delete.");
        return Ok(());
    }
    let names: Vec<&str> = courses.iter().map(|c| c.name.as_str()).collect();
    let name = names[choose("Select a Course to Delete", &names, None)?];
    if !confirm(&format!("Delete {} and its PDF?", name))? {
        return Ok(());
    }

    let outcome = admin.remove(name).await?;
    println!("✅ Course {} deleted (commit {})", name, outcome.table.commit);
    match outcome.blob {
        BlobOutcome::Deleted { commit } => {
            println!("✅ PDF {} deleted (commit {})", outcome.removed.file_path, commit)
        }
        BlobOutcome::Missing => println!("⚠️ No PDF found at {}", outcome.removed.file_path),
        BlobOutcome::Failed(e) => println!("❌ Error deleting PDF {}: {}", outcome.removed.file_path, e),
    }
    Ok(())
}
