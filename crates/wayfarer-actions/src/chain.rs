use crate::validator::ValidatorChain;
use crate::validators::{
    ContentValidator, ControlFlowValidator, EvaluationValidator, InteractionValidator,
    NavigationValidator, WaitValidator,
};

/// Builds the validator chain in spec order: structural checks first, then
/// the two security-sensitive passes (evaluation, control-flow) last so a
/// cheap rejection (e.g. an empty selector) never pays for a regex scan.
pub fn default_chain(host_block_list: Vec<String>, allow_file_scheme: bool) -> ValidatorChain {
    ValidatorChain::new(vec![
        Box::new(NavigationValidator { host_block_list, allow_file_scheme }),
        Box::new(InteractionValidator),
        Box::new(WaitValidator),
        Box::new(ContentValidator),
        Box::new(EvaluationValidator),
        Box::new(ControlFlowValidator),
    ])
}
