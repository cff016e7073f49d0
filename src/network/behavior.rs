use libp2p::swarm::NetworkBehaviour;
use libp2p::{identify, identity, ping};
use libp2p_stream as stream;

#[derive(NetworkBehaviour)]
pub struct ProgressBehavior {
    pub stream: stream::Behaviour,
    pub identify: identify::Behaviour,
    pub ping: ping::Behaviour,
}

pub fn build_behavior(local_key: &identity::Keypair) -> ProgressBehavior {
    let identify_config =
        identify::Config::new("learnfil-p2p/1.0.0".into(), local_key.public());

    ProgressBehavior {
        stream: stream::Behaviour::new(),
        identify: identify::Behaviour::new(identify_config),
        ping: ping::Behaviour::new(ping::Config::default()),
    }
}
