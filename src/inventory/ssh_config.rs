// dbinventory — SSH config rendering
//
// Prints the assembled inventory as `~/.ssh/config` stanzas, one per host in
// host order, each preceded by a comment listing the host's tags.

use super::Inventory;

const BANNER: &str = "##### dbinventory hosts #####\n#############################\n";

pub fn render_ssh_config(inventory: &Inventory) -> String {
    let groups = inventory.groups_by_host();
    let mut out = String::from(BANNER);

    for (host, vars) in &inventory.meta.hostvars {
        let tags = groups.get(host.as_str()).map(|g| g.join(", ")).unwrap_or_default();

        out.push_str(&format!("\n## {} groups: {}\n", host, tags));
        out.push_str(&format!("Host {}\n", host));
        if let Some(addr) = &vars.ansible_ssh_host {
            out.push_str(&format!("HostName {}\n", addr));
        }
        if let Some(user) = &vars.ansible_ssh_user {
            out.push_str(&format!("User {}\n", user));
        }
    }

    out
}
