//! Stock provisioning document: the rules a fresh deployment starts
//! with. `allow_all` grants everything until an administrator narrows
//! policy; `allow_systemd-user` keeps user session scopes working once
//! `allow_all` is disabled.

use palisade_store::PolicyDomain;

use crate::error::Result;
use crate::importer::{import_document, ImportReport};

/// Default HBAC entries, in the declarative update-file format.
pub const DEFAULT_HBAC_DOCUMENT: &str = "\
# Default HBAC policy.

dn: cn=systemd-user,cn=hbacservices,cn=hbac,$SUFFIX
default:objectclass: ipahbacsvc
default:objectclass: top
default:cn: systemd-user
default:description: pam_systemd session scope

dn: cn=allow_all,cn=hbac,$SUFFIX
default:objectclass: ipahbacrule
default:objectclass: top
default:ipauniqueid: autogenerate
default:accessruletype: allow
default:usercategory: all
default:hostcategory: all
default:servicecategory: all
default:ipaenabledflag: TRUE
default:description: Allow all users to access any host from any host

dn: cn=allow_systemd-user,cn=hbac,$SUFFIX
default:objectclass: ipahbacrule
default:objectclass: top
default:ipauniqueid: autogenerate
default:accessruletype: allow
default:usercategory: all
default:hostcategory: all
default:ipaenabledflag: TRUE
default:description: Allow pam_systemd to run user@.service to create a system user session
default:memberservice: cn=systemd-user,cn=hbacservices,cn=hbac,$SUFFIX
";

/// Imports the stock default entries into a domain.
pub fn load_defaults(domain: &PolicyDomain) -> Result<ImportReport> {
    import_document(domain, DEFAULT_HBAC_DOCUMENT)
}
