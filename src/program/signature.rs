/// Describes a program's input/output field shape and base instructions.
///
/// This is an external collaborator surface (spec §1, §6): the core treats
/// it as an opaque source of field names and prompt text. Concrete
/// implementations (schema derivation, prompt templating) live outside this
/// crate, grounded on the teacher's `MetaSignature`/`Signature` split.
pub trait SignatureInfo: Send + Sync {
    fn input_fields(&self) -> Vec<String>;
    fn output_fields(&self) -> Vec<String>;
    fn description(&self) -> Option<String> {
        None
    }
    fn instructions(&self) -> Option<String> {
        None
    }
}
