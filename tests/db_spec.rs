use std::sync::Arc;

use reqdb::config::Config;
use reqdb::db::{DatabaseManager, MEMORY_PATH};
use reqdb::models::*;
use reqdb::Error;
use speculate2::speculate;

fn create_user(db: &DatabaseManager, username: &str, role: Role) -> Arc<User> {
    let user = User::new(username, format!("{username}@x.com"), role);
    db.users().create_user(&user).expect("Failed to create user");
    Arc::new(user)
}

speculate! {
    before {
        let db = DatabaseManager::open_memory().expect("Failed to create in-memory database");
        db.migrate().expect("Failed to run migrations");
    }

    describe "database_manager" {
        it "migrates repeatedly without error" {
            db.migrate().expect("Second migration failed");
            db.migrate().expect("Third migration failed");
        }

        it "initializes the same file store twice" {
            let dir = tempfile::tempdir().expect("Failed to create temp dir");
            let path = dir.path().join("nested").join("reqdb.db");

            let first = DatabaseManager::initialize(&path).expect("First initialize failed");
            create_user(&first, "alice", Role::Developer);
            drop(first);

            let second = DatabaseManager::initialize(&path).expect("Second initialize failed");
            let found = second.users().find_by_username("alice").expect("Query failed");
            assert!(found.is_some());
        }

        it "treats the memory path as an ephemeral store" {
            let a = DatabaseManager::initialize(MEMORY_PATH).expect("Failed to initialize");
            create_user(&a, "alice", Role::Developer);

            let b = DatabaseManager::initialize(MEMORY_PATH).expect("Failed to initialize");
            assert!(b.users().find_by_username("alice").expect("Query failed").is_none());
            assert_eq!(b.path().to_str(), Some(MEMORY_PATH));
        }

        it "opens from configuration" {
            let dir = tempfile::tempdir().expect("Failed to create temp dir");
            let config = Config {
                database_path: dir.path().join("configured.db"),
                log_filter: "reqdb=debug".to_string(),
                wal_mode: false,
            };

            let db = DatabaseManager::from_config(&config).expect("Failed to open from config");
            assert_eq!(db.path(), config.database_path.as_path());
            assert!(db.users().list_users().expect("Query failed").is_empty());
        }

        it "fails to open a path inside a file" {
            let file = tempfile::NamedTempFile::new().expect("Failed to create temp file");
            let result = DatabaseManager::initialize(file.path().join("reqdb.db"));
            assert!(result.is_err());
        }

        it "closes once and then ignores further closes" {
            let mut db = db;
            assert!(db.is_open());

            db.close().expect("First close failed");
            assert!(!db.is_open());
            db.close().expect("Second close should be a no-op");
        }

        it "refuses work after closing" {
            let mut db = db;
            db.close().expect("Close failed");

            let result = db.users().find_by_username("alice");
            assert!(matches!(result, Err(Error::Closed)));
            assert!(matches!(db.migrate(), Err(Error::Closed)));
        }
    }

    describe "users" {
        describe "create_user" {
            it "finds a created user by username" {
                let user = User::new("alice", "alice@x.com", Role::Developer);
                db.users().create_user(&user).expect("Failed to create user");

                let found = db.users().find_by_username("alice")
                    .expect("Query failed")
                    .expect("User should exist");
                assert_eq!(found.username, "alice");
                assert_eq!(found.email, "alice@x.com");
                assert_eq!(found.role, Role::Developer);
            }

            it "stores the password hash" {
                let mut user = User::new("bob", "bob@x.com", Role::Admin);
                user.set_password("hunter2").expect("Failed to hash password");
                db.users().create_user(&user).expect("Failed to create user");

                let found = db.users().find_by_username("bob")
                    .expect("Query failed")
                    .expect("User should exist");
                assert_eq!(found.password_hash(), user.password_hash());
                assert!(found.verify_password("hunter2"));
                assert!(!found.verify_password("hunter3"));
            }

            it "rejects a duplicate username" {
                create_user(&db, "alice", Role::Developer);

                let duplicate = User::new("alice", "other@x.com", Role::Viewer);
                let result = db.users().create_user(&duplicate);
                assert!(matches!(result, Err(Error::Execute(_))));
            }

            it "returns increasing ids" {
                let a = db.users().create_user(&User::new("a", "a@x.com", Role::Viewer)).expect("Failed");
                let b = db.users().create_user(&User::new("b", "b@x.com", Role::Viewer)).expect("Failed");
                assert!(b > a);
            }
        }

        describe "find_by_username" {
            it "returns None for an unknown username" {
                let result = db.users().find_by_username("nobody").expect("Query failed");
                assert!(result.is_none());
            }
        }

        describe "list_users" {
            it "returns users ordered by username" {
                create_user(&db, "zoe", Role::Viewer);
                create_user(&db, "adam", Role::Admin);

                let users = db.users().list_users().expect("Query failed");
                let names: Vec<&str> = users.iter().map(|u| u.username.as_str()).collect();
                assert_eq!(names, vec!["adam", "zoe"]);
            }
        }
    }

    describe "projects" {
        before {
            let owner = create_user(&db, "owner", Role::ProjectManager);
            let user1 = create_user(&db, "user1", Role::Developer);
            let user2 = create_user(&db, "user2", Role::Developer);
        }

        it "stores and reloads a project with its collaborators in order" {
            let mut project = Project::new("Apollo", "Moonshot", owner.clone());
            project.add_collaborator(user2.clone());
            project.add_collaborator(user1.clone());

            let id = db.projects().create_project(&project).expect("Failed to create project");
            let found = db.projects().find_by_id(id)
                .expect("Query failed")
                .expect("Project should exist");

            assert_eq!(found.title(), "Apollo");
            assert_eq!(found.description(), "Moonshot");
            assert_eq!(found.owner().username, "owner");
            assert_eq!(found.created_at(), project.created_at());
            assert_eq!(found.to_json(), project.to_json());
        }

        it "returns None for an unknown id" {
            assert!(db.projects().find_by_id(999).expect("Query failed").is_none());
        }

        it "rejects an owner that is not a stored user" {
            let stranger = Arc::new(User::new("stranger", "s@x.com", Role::Viewer));
            let project = Project::new("Orphan", "", stranger);

            let result = db.projects().create_project(&project);
            assert!(matches!(result, Err(Error::Execute(_))));
        }

        it "rolls back the project when a collaborator is not stored" {
            let mut project = Project::new("Partial", "", owner.clone());
            project.add_collaborator(Arc::new(User::new("ghost", "g@x.com", Role::Viewer)));

            assert!(db.projects().create_project(&project).is_err());
            assert!(db.projects().find_by_owner("owner").expect("Query failed").is_empty());
        }

        it "rejects a stored creation time outside the representable range" {
            let dir = tempfile::tempdir().expect("Failed to create temp dir");
            let path = dir.path().join("reqdb.db");
            let store = DatabaseManager::initialize(&path).expect("Failed to initialize");
            create_user(&store, "owner", Role::ProjectManager);
            let id = store.projects()
                .create_project(&Project::new("Apollo", "", owner.clone()))
                .expect("Failed to create project");

            let raw = rusqlite::Connection::open(&path).expect("Failed to open raw connection");
            raw.execute("UPDATE projects SET created_at = ?1 WHERE id = ?2", (i64::MAX, id))
                .expect("Failed to corrupt timestamp");
            drop(raw);

            let result = store.projects().find_by_id(id);
            assert!(matches!(
                result,
                Err(Error::Execute(rusqlite::Error::IntegralValueOutOfRange(_, i64::MAX)))
            ));
            assert!(store.projects().find_by_owner("owner").is_err());
        }

        it "lists projects by owner with their ids" {
            let first = db.projects().create_project(&Project::new("One", "", owner.clone())).expect("Failed");
            let second = db.projects().create_project(&Project::new("Two", "", owner.clone())).expect("Failed");
            db.projects().create_project(&Project::new("Other", "", user1.clone())).expect("Failed");

            let owned = db.projects().find_by_owner("owner").expect("Query failed");
            let ids: Vec<i64> = owned.iter().map(|(id, _)| *id).collect();
            assert_eq!(ids, vec![first, second]);
            assert_eq!(owned[1].1.title(), "Two");
        }
    }

    describe "requirements" {
        it "persists every field" {
            let mut req = Requirement::new("Login", "Users can log in");
            req.status = Some("approved".to_string());
            req.priority = Some(2);
            req.assignee = Some("alice".to_string());

            let id = db.requirements().create_requirement(&req).expect("Failed to create requirement");
            let found = db.requirements().find_by_id(id)
                .expect("Query failed")
                .expect("Requirement should exist");

            assert_eq!(found.title, "Login");
            assert_eq!(found.description, "Users can log in");
            assert_eq!(found.status.as_deref(), Some("approved"));
            assert_eq!(found.priority, Some(2));
            assert_eq!(found.assignee.as_deref(), Some("alice"));
        }

        it "stamps unset timestamps" {
            let id = db.requirements()
                .create_requirement(&Requirement::new("T", "D"))
                .expect("Failed to create requirement");
            let found = db.requirements().find_by_id(id).expect("Query failed").expect("Requirement should exist");

            assert!(found.created_at.is_some());
            assert!(found.updated_at.is_some());
            assert!(found.status.is_none());
            assert!(found.priority.is_none());
        }

        it "keeps provided timestamps verbatim" {
            let mut req = Requirement::new("T", "D");
            req.created_at = Some("yesterday".to_string());
            req.updated_at = Some("today".to_string());

            let id = db.requirements().create_requirement(&req).expect("Failed to create requirement");
            let found = db.requirements().find_by_id(id).expect("Query failed").expect("Requirement should exist");
            assert_eq!(found, req);
        }

        it "returns None for an unknown id" {
            assert!(db.requirements().find_by_id(42).expect("Query failed").is_none());
        }

        it "lists requirements in creation order" {
            let a = db.requirements().create_requirement(&Requirement::new("A", "")).expect("Failed");
            let b = db.requirements().create_requirement(&Requirement::new("B", "")).expect("Failed");

            let all = db.requirements().list_requirements().expect("Query failed");
            assert_eq!(all.len(), 2);
            assert_eq!(all[0].0, a);
            assert_eq!(all[1].0, b);
            assert_eq!(all[1].1.title, "B");
        }

        describe "projects" {
            before {
                let owner = create_user(&db, "owner", Role::ProjectManager);
                let project_id = db.projects()
                    .create_project(&Project::new("Apollo", "", owner))
                    .expect("Failed to create project");
            }

            it "finds requirements linked to a project" {
                let linked = db.requirements().create_requirement(&Requirement::new("Linked", "")).expect("Failed");
                db.requirements().create_requirement(&Requirement::new("Unlinked", "")).expect("Failed");

                db.requirements().link_to_project(project_id, linked).expect("Failed to link");
                db.requirements().link_to_project(project_id, linked).expect("Linking twice should be a no-op");

                let found = db.requirements().find_by_project(project_id).expect("Query failed");
                assert_eq!(found.len(), 1);
                assert_eq!(found[0].0, linked);
                assert_eq!(found[0].1.title, "Linked");
            }

            it "returns an empty list for a project without requirements" {
                assert!(db.requirements().find_by_project(project_id).expect("Query failed").is_empty());
            }

            it "reports missing link endpoints as not found" {
                let req = db.requirements().create_requirement(&Requirement::new("R", "")).expect("Failed");

                let missing_project = db.requirements().link_to_project(999, req);
                assert!(matches!(missing_project, Err(Error::NotFound { entity: "project", .. })));

                let missing_requirement = db.requirements().link_to_project(project_id, 999);
                assert!(matches!(missing_requirement, Err(Error::NotFound { entity: "requirement", .. })));
            }
        }
    }

    describe "diagrams" {
        it "stores and reloads a diagram" {
            let mut diagram = UmlDiagram::new("Checkout", DiagramType::Sequence);
            diagram.set_content("alice -> shop: order");

            let id = db.diagrams().create_diagram(&diagram).expect("Failed to create diagram");
            let found = db.diagrams().find_by_id(id)
                .expect("Query failed")
                .expect("Diagram should exist");

            assert_eq!(found.name, "Checkout");
            assert_eq!(found.kind, DiagramType::Sequence);
            assert_eq!(found.content.as_deref(), Some("alice -> shop: order"));
            assert!(found.created_at.is_some());
        }

        it "stores a diagram without content" {
            let id = db.diagrams()
                .create_diagram(&UmlDiagram::new("Empty", DiagramType::State))
                .expect("Failed to create diagram");
            let found = db.diagrams().find_by_id(id).expect("Query failed").expect("Diagram should exist");
            assert!(found.content.is_none());
        }

        it "returns None for an unknown id" {
            assert!(db.diagrams().find_by_id(7).expect("Query failed").is_none());
        }
    }

    describe "traceability" {
        before {
            let ids: Vec<String> = ["Login", "Logout", "Audit"]
                .iter()
                .map(|title| {
                    db.requirements()
                        .create_requirement(&Requirement::new(*title, ""))
                        .expect("Failed to create requirement")
                        .to_string()
                })
                .collect();
            let (login, logout, audit) = (&ids[0], &ids[1], &ids[2]);
        }

        it "stores and reloads a link" {
            let link = Traceability::new(login.as_str(), logout.as_str(), RelationType::Implements);
            let id = db.traceability().create_link(&link).expect("Failed to create link");

            let found = db.traceability().find_by_id(id)
                .expect("Query failed")
                .expect("Link should exist");
            assert_eq!(found.source_id(), login.as_str());
            assert_eq!(found.target_id(), logout.as_str());
            assert_eq!(found.relation(), RelationType::Implements);
            assert!(found.created_at().is_some());
        }

        it "finds links from either end" {
            let outgoing = db.traceability()
                .create_link(&Traceability::new(login.as_str(), logout.as_str(), RelationType::DependsOn))
                .expect("Failed");
            let incoming = db.traceability()
                .create_link(&Traceability::new(audit.as_str(), login.as_str(), RelationType::Verifies))
                .expect("Failed");
            db.traceability()
                .create_link(&Traceability::new(logout.as_str(), audit.as_str(), RelationType::Refines))
                .expect("Failed");

            let links = db.traceability().find_for_requirement(login).expect("Query failed");
            let ids: Vec<i64> = links.iter().map(|(id, _)| *id).collect();
            assert_eq!(ids, vec![outgoing, incoming]);
            assert_eq!(links[1].1.relation(), RelationType::Verifies);
        }

        it "stores self references unchanged" {
            let link = Traceability::new(audit.as_str(), audit.as_str(), RelationType::ConflictsWith);
            let id = db.traceability().create_link(&link).expect("Failed to create link");

            let found = db.traceability().find_by_id(id)
                .expect("Query failed")
                .expect("Link should exist");
            assert!(found.is_self_reference());
        }

        it "rejects links to requirements that were never stored" {
            let missing_source = Traceability::new("999", login.as_str(), RelationType::Verifies);
            let result = db.traceability().create_link(&missing_source);
            assert!(matches!(result, Err(Error::NotFound { entity: "requirement", .. })));

            let missing_target = Traceability::new(login.as_str(), "1000", RelationType::Verifies);
            let result = db.traceability().create_link(&missing_target);
            assert!(matches!(result, Err(Error::NotFound { entity: "requirement", .. })));

            assert!(db.traceability().find_for_requirement("999").expect("Query failed").is_empty());
            assert!(db.traceability().find_for_requirement(login).expect("Query failed").is_empty());
        }

        it "rejects endpoints that are not requirement ids" {
            let link = Traceability::new("REQ-1", login.as_str(), RelationType::Refines);
            let result = db.traceability().create_link(&link);
            assert!(matches!(result, Err(Error::NotFound { entity: "requirement", .. })));
        }
    }
}
