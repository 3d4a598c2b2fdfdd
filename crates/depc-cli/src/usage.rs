//! Hints printed after a successful run

use depc_core::ProvisionOutcome;

pub fn print_hints(outcome: &ProvisionOutcome) {
    let id = outcome.container.id.short();
    println!(
        "Access container: docker exec -it {} {}",
        id,
        outcome.shell.path()
    );
    println!("Stop container: docker stop {}", id);
    println!("Remove container: docker rm {}", id);
    println!("List all containers: docker ps -a");
    println!("Stop all containers: docker stop $(docker ps -a -q)");
    println!("Remove all containers: docker rm $(docker ps -a -q)");
    println!("Log location: {}", outcome.workdir.join("log").display());
    println!("Source location: {}", outcome.source_dir.display());
}
