use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing::info;

use rakto_client::{
    BloodRequestForm, ClientConfig, ClientError, DonorRegistrationForm, DonorService,
    RequestService,
};
use rakto_core::{BloodGroup, DocumentStore, DonorFilter, RequestFilter, RequestStatus};
use rakto_database::Database;

#[derive(Debug, Parser)]
#[command(name = "rakto")]
#[command(about = "Search and manage donors and blood requests in a RaktoConnect store")]
struct Cli {
    /// Database URL. Falls back to RAKTO_DATABASE_URL env.
    #[arg(long, global = true)]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Create or upgrade the database schema
    Migrate,

    /// Donor profiles
    #[command(subcommand)]
    Donors(DonorCommand),

    /// Blood requests
    #[command(subcommand)]
    Requests(RequestCommand),
}

#[derive(Debug, Subcommand)]
enum DonorCommand {
    /// Search donors, newest first
    Search {
        #[arg(long)]
        blood_group: Option<BloodGroup>,
        #[arg(long)]
        city: Option<String>,
        #[arg(long)]
        state: Option<String>,
        /// Only donors with this availability
        #[arg(long)]
        available: Option<bool>,
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Register a donor profile for a user
    Register(RegisterArgs),

    /// Set a donor's availability
    Availability {
        donor_id: String,
        #[arg(action = clap::ArgAction::Set)]
        available: bool,
    },
}

#[derive(Debug, Args)]
struct RegisterArgs {
    /// Owning user's uid
    #[arg(long)]
    user: String,
    /// Owning user's phone number
    #[arg(long)]
    phone: String,
    #[arg(long, default_value = "")]
    name: String,
    #[arg(long, default_value = "")]
    blood_group: String,
    /// Date of birth (YYYY-MM-DD)
    #[arg(long, default_value = "")]
    dob: String,
    #[arg(long, default_value = "")]
    gender: String,
    #[arg(long, default_value = "")]
    address: String,
    #[arg(long, default_value = "")]
    city: String,
    #[arg(long, default_value = "")]
    state: String,
    #[arg(long, default_value = "")]
    pincode: String,
    #[arg(long, default_value = "")]
    emergency_name: String,
    #[arg(long, default_value = "")]
    emergency_phone: String,
}

#[derive(Debug, Subcommand)]
enum RequestCommand {
    /// Search blood requests, newest first
    Search {
        /// Only requests posted by this uid
        #[arg(long)]
        user: Option<String>,
        #[arg(long)]
        blood_group: Option<BloodGroup>,
        #[arg(long)]
        city: Option<String>,
        #[arg(long)]
        state: Option<String>,
        #[arg(long)]
        status: Option<RequestStatus>,
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Post a new blood request
    Create(CreateRequestArgs),

    /// Move a request to a new status (fulfilled or cancelled)
    Status {
        request_id: String,
        status: RequestStatus,
    },
}

#[derive(Debug, Args)]
struct CreateRequestArgs {
    /// Requesting user's uid
    #[arg(long)]
    user: String,
    #[arg(long, default_value = "")]
    patient: String,
    #[arg(long, default_value = "")]
    blood_group: String,
    #[arg(long, default_value = "1")]
    units: String,
    #[arg(long, default_value = "")]
    hospital: String,
    #[arg(long, default_value = "")]
    hospital_address: String,
    #[arg(long, default_value = "")]
    city: String,
    #[arg(long, default_value = "")]
    state: String,
    #[arg(long, default_value = "medium")]
    urgency: String,
    #[arg(long, default_value = "")]
    contact: String,
    #[arg(long, default_value = "")]
    info: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    let mut config = ClientConfig::from_env()?;
    if let Some(url) = cli.database_url {
        config.database_url = url;
    }

    let db = Database::connect_with_pool_size(&config.database_url, config.pool_size).await?;
    let store: Arc<dyn DocumentStore> = Arc::new(db.clone());

    let result = match cli.command {
        Command::Migrate => {
            db.migrate().await?;
            Ok(())
        }
        Command::Donors(command) => run_donors(DonorService::new(store), command).await,
        Command::Requests(command) => run_requests(RequestService::new(store), command).await,
    };

    db.close().await;
    result.map_err(|e| e.user_message().into())
}

async fn run_donors(service: DonorService, command: DonorCommand) -> Result<(), ClientError> {
    match command {
        DonorCommand::Search {
            blood_group,
            city,
            state,
            available,
            limit,
        } => {
            let filter = DonorFilter {
                user_id: None,
                blood_group,
                city,
                state,
                is_available: available,
                limit,
            };
            let donors = service.search(&filter).await?;
            info!("Found {} donor(s)", donors.len());
            print_json(&donors)
        }
        DonorCommand::Register(args) => {
            let form = DonorRegistrationForm {
                name: args.name,
                blood_group: args.blood_group,
                date_of_birth: args.dob,
                gender: args.gender,
                address: args.address,
                city: args.city,
                state: args.state,
                pincode: args.pincode,
                emergency_contact_name: args.emergency_name,
                emergency_contact_phone: args.emergency_phone,
                location: None,
            };
            let donor = service.register(&args.user, &args.phone, &form).await?;
            info!(donor_id = %donor.id, "Registered donor");
            print_json(&donor)
        }
        DonorCommand::Availability {
            donor_id,
            available,
        } => {
            let donor = service.set_availability(&donor_id, available).await?;
            print_json(&donor)
        }
    }
}

async fn run_requests(service: RequestService, command: RequestCommand) -> Result<(), ClientError> {
    match command {
        RequestCommand::Search {
            user,
            blood_group,
            city,
            state,
            status,
            limit,
        } => {
            let filter = RequestFilter {
                user_id: user,
                blood_group,
                city,
                state,
                status,
                limit,
            };
            let requests = service.search(&filter).await?;
            info!("Found {} request(s)", requests.len());
            print_json(&requests)
        }
        RequestCommand::Create(args) => {
            let form = BloodRequestForm {
                patient_name: args.patient,
                blood_group: args.blood_group,
                units: args.units,
                hospital_name: args.hospital,
                hospital_address: args.hospital_address,
                city: args.city,
                state: args.state,
                urgency: args.urgency,
                contact_number: args.contact,
                additional_info: args.info,
            };
            let request = service.create(&args.user, &form).await?;
            info!(request_id = %request.id, "Created blood request");
            print_json(&request)
        }
        RequestCommand::Status { request_id, status } => {
            let request = service.update_status(&request_id, status).await?;
            print_json(&request)
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<(), ClientError> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| ClientError::Backend(rakto_core::BackendError::Encode(e)))?;
    println!("{}", text);
    Ok(())
}
