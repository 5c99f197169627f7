//! Operation documents understood by the remote tracker store.

pub const GET_TRACKER: &str = r#"
query trackerStore(
    $senderId: String!
    $projectId: String!
    $after: Int
    $maxEvents: Int
) {
    trackerStore(senderId: $senderId, projectId: $projectId, after: $after, maxEvents: $maxEvents) {
        tracker
        lastIndex
        lastTimestamp
    }
}
"#;

pub const INSERT_TRACKER: &str = r#"
mutation insertTracker(
    $senderId: String!
    $projectId: String!
    $tracker: Any
    $env: Environment
) {
    insertTrackerStore(senderId: $senderId, projectId: $projectId, tracker: $tracker, env: $env) {
        lastIndex
        lastTimestamp
    }
}
"#;

pub const UPDATE_TRACKER: &str = r#"
mutation updateTracker(
    $senderId: String!
    $projectId: String!
    $tracker: Any
    $env: Environment
) {
    updateTrackerStore(senderId: $senderId, projectId: $projectId, tracker: $tracker, env: $env) {
        lastIndex
        lastTimestamp
    }
}
"#;
