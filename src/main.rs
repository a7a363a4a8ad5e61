use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use reqdb::config::Config;
use reqdb::db::DatabaseManager;
use reqdb::models::{
    DiagramType, Project, RelationType, Requirement, Role, Traceability, UmlDiagram, User,
};

#[derive(Parser)]
#[command(name = "reqdb")]
#[command(about = "Track requirements, traceability links and UML diagrams")]
struct Cli {
    /// Database file to use instead of the configured one (`:memory:` for a scratch store)
    #[arg(long, global = true)]
    database: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the database and its schema if missing
    Init,
    /// Manage users
    #[command(subcommand)]
    User(UserCommand),
    /// Manage requirements
    #[command(subcommand)]
    Requirement(RequirementCommand),
    /// Manage projects
    #[command(subcommand)]
    Project(ProjectCommand),
    /// Manage UML diagrams
    #[command(subcommand)]
    Diagram(DiagramCommand),
    /// Manage traceability links between requirements
    #[command(subcommand)]
    Trace(TraceCommand),
}

#[derive(Subcommand)]
enum UserCommand {
    Add {
        username: String,
        email: String,
        /// admin, project_manager, developer or viewer
        #[arg(short, long, default_value = "developer", value_parser = parse_role)]
        role: Role,
        /// Plain-text password; stored as an Argon2 hash
        #[arg(short, long)]
        password: Option<String>,
    },
    Show {
        username: String,
    },
    List,
}

#[derive(Subcommand)]
enum RequirementCommand {
    Add {
        title: String,
        #[arg(short, long, default_value = "")]
        description: String,
        #[arg(short, long)]
        status: Option<String>,
        #[arg(short, long)]
        priority: Option<i32>,
        #[arg(short, long)]
        assignee: Option<String>,
    },
    Show {
        id: i64,
    },
    List {
        /// Only requirements attached to this project
        #[arg(long)]
        project: Option<i64>,
    },
    /// Attach a requirement to a project
    Link {
        project_id: i64,
        requirement_id: i64,
    },
}

#[derive(Subcommand)]
enum ProjectCommand {
    Create {
        title: String,
        /// Username of the owner
        owner: String,
        #[arg(short, long, default_value = "")]
        description: String,
        /// Collaborator usernames
        #[arg(short, long)]
        collaborator: Vec<String>,
    },
    Show {
        id: i64,
    },
}

#[derive(Subcommand)]
enum DiagramCommand {
    Add {
        name: String,
        /// class, sequence, activity, state, component or deployment
        #[arg(short, long, default_value = "class", value_parser = parse_diagram_type)]
        kind: DiagramType,
        /// Read the diagram body from this file
        #[arg(short, long)]
        content: Option<PathBuf>,
    },
    Show {
        id: i64,
    },
}

#[derive(Subcommand)]
enum TraceCommand {
    Add {
        source_id: String,
        target_id: String,
        /// depends_on, derived_from, implements, verifies, refines or conflicts_with
        #[arg(short, long, default_value = "depends_on", value_parser = parse_relation)]
        relation: RelationType,
    },
    /// Links touching a requirement
    List {
        requirement_id: String,
    },
}

fn parse_role(s: &str) -> Result<Role, String> {
    Role::from_str(s).ok_or_else(|| format!("unknown role: {s}"))
}

fn parse_diagram_type(s: &str) -> Result<DiagramType, String> {
    DiagramType::from_str(s).ok_or_else(|| format!("unknown diagram type: {s}"))
}

fn parse_relation(s: &str) -> Result<RelationType, String> {
    RelationType::from_str(s).ok_or_else(|| format!("unknown relation type: {s}"))
}

/// Initialize tracing on stderr so stdout carries only command output
fn init_tracing(filter: &str) {
    let filter = tracing_subscriber::EnvFilter::new(filter);

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn print_json(value: &serde_json::Value) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load();
    if let Some(path) = cli.database {
        config.database_path = path;
    }
    init_tracing(&config.log_filter);

    let mut db = DatabaseManager::from_config(&config)
        .with_context(|| format!("Failed to open {}", config.database_path.display()))?;

    match cli.command {
        Commands::Init => {
            println!("Database ready at {}", db.path().display());
        }
        Commands::User(cmd) => run_user(&db, cmd)?,
        Commands::Requirement(cmd) => run_requirement(&db, cmd)?,
        Commands::Project(cmd) => run_project(&db, cmd)?,
        Commands::Diagram(cmd) => run_diagram(&db, cmd)?,
        Commands::Trace(cmd) => run_trace(&db, cmd)?,
    }

    db.close()?;
    Ok(())
}

fn run_user(db: &DatabaseManager, cmd: UserCommand) -> anyhow::Result<()> {
    match cmd {
        UserCommand::Add {
            username,
            email,
            role,
            password,
        } => {
            let mut user = User::new(username, email, role);
            if let Some(password) = password {
                user.set_password(&password)?;
            }
            let id = db.users().create_user(&user)?;
            println!("Created user {} (id {})", user.username, id);
        }
        UserCommand::Show { username } => {
            let user = db
                .users()
                .find_by_username(&username)?
                .ok_or_else(|| anyhow::anyhow!("User not found: {}", username))?;
            print_json(&user.to_json())?;
        }
        UserCommand::List => {
            for user in db.users().list_users()? {
                println!("{}\t{}\t{}", user.username, user.email, user.role.as_str());
            }
        }
    }
    Ok(())
}

fn run_requirement(db: &DatabaseManager, cmd: RequirementCommand) -> anyhow::Result<()> {
    match cmd {
        RequirementCommand::Add {
            title,
            description,
            status,
            priority,
            assignee,
        } => {
            let mut requirement = Requirement::new(title, description);
            requirement.status = status;
            requirement.priority = priority;
            requirement.assignee = assignee;
            let id = db.requirements().create_requirement(&requirement)?;
            println!("Created requirement {}", id);
        }
        RequirementCommand::Show { id } => {
            let requirement = db
                .requirements()
                .find_by_id(id)?
                .ok_or_else(|| anyhow::anyhow!("Requirement not found: {}", id))?;
            print_json(&requirement.to_json())?;
        }
        RequirementCommand::List { project } => {
            let requirements = match project {
                Some(project_id) => db.requirements().find_by_project(project_id)?,
                None => db.requirements().list_requirements()?,
            };
            for (id, requirement) in requirements {
                println!(
                    "{}\t{}\t{}",
                    id,
                    requirement.status.as_deref().unwrap_or("-"),
                    requirement.title
                );
            }
        }
        RequirementCommand::Link {
            project_id,
            requirement_id,
        } => {
            db.requirements().link_to_project(project_id, requirement_id)?;
            println!("Linked requirement {} to project {}", requirement_id, project_id);
        }
    }
    Ok(())
}

fn run_project(db: &DatabaseManager, cmd: ProjectCommand) -> anyhow::Result<()> {
    match cmd {
        ProjectCommand::Create {
            title,
            owner,
            description,
            collaborator,
        } => {
            let users = db.users();
            let lookup = |username: &str| -> anyhow::Result<Arc<User>> {
                users
                    .find_by_username(username)?
                    .map(Arc::new)
                    .ok_or_else(|| anyhow::anyhow!("User not found: {}", username))
            };

            let mut project = Project::new(title, description, lookup(&owner)?);
            for username in &collaborator {
                if !project.add_collaborator(lookup(username)?) {
                    eprintln!("Skipping {}: already on the project", username);
                }
            }

            let id = db.projects().create_project(&project)?;
            println!("Created project {} (id {})", project.title(), id);
        }
        ProjectCommand::Show { id } => {
            let project = db
                .projects()
                .find_by_id(id)?
                .ok_or_else(|| anyhow::anyhow!("Project not found: {}", id))?;
            print_json(&project.to_json())?;
        }
    }
    Ok(())
}

fn run_diagram(db: &DatabaseManager, cmd: DiagramCommand) -> anyhow::Result<()> {
    match cmd {
        DiagramCommand::Add {
            name,
            kind,
            content,
        } => {
            let mut diagram = UmlDiagram::new(name, kind);
            if let Some(path) = content {
                let body = std::fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read {}", path.display()))?;
                diagram.set_content(body);
            }
            let id = db.diagrams().create_diagram(&diagram)?;
            println!("Created diagram {}", id);
        }
        DiagramCommand::Show { id } => {
            let diagram = db
                .diagrams()
                .find_by_id(id)?
                .ok_or_else(|| anyhow::anyhow!("Diagram not found: {}", id))?;
            print_json(&diagram.to_json())?;
        }
    }
    Ok(())
}

fn run_trace(db: &DatabaseManager, cmd: TraceCommand) -> anyhow::Result<()> {
    match cmd {
        TraceCommand::Add {
            source_id,
            target_id,
            relation,
        } => {
            let link = Traceability::new(source_id, target_id, relation);
            let id = db.traceability().create_link(&link)?;
            println!("Created link {}", id);
        }
        TraceCommand::List { requirement_id } => {
            for (id, link) in db.traceability().find_for_requirement(&requirement_id)? {
                println!(
                    "{}\t{} --{}--> {}",
                    id,
                    link.source_id(),
                    link.relation().as_str(),
                    link.target_id()
                );
            }
        }
    }
    Ok(())
}
