//! Route guard and menu inspection.

use fitwear_client::navigation::GuardDecision;
use fitwear_client::state::AppState;

pub fn access(app: &AppState, location: &str) {
    let decision = app.guard().check(location);
    match &decision {
        GuardDecision::Allow => println!("{location}: allowed"),
        GuardDecision::Pending => println!("{location}: session still loading"),
        GuardDecision::RedirectToLogin { .. } | GuardDecision::Forbidden => {
            let target = decision.redirect_target().unwrap_or_default();
            let reason = if decision == GuardDecision::Forbidden {
                "forbidden"
            } else {
                "sign-in required"
            };
            println!("{location}: {reason}, redirect to {target}");
        }
    }
}

pub fn menu(app: &AppState) {
    for entry in app.menu() {
        match entry.badge {
            Some(count) => println!("{:<14} {} ({count})", entry.label, entry.route),
            None => println!("{:<14} {}", entry.label, entry.route),
        }
    }
}
